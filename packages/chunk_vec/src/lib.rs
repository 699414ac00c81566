//! A growable array backed by a [`chunk_pool::PoolAllocator`].
//!
//! [`PoolVec<T>`] is a minimal `Vec`-like container that obtains all its storage from a
//! pool allocator, making it a convenient way to exercise and demonstrate pool-backed
//! containers. Every fallible operation reports allocator failures as a
//! [`chunk_pool::Error`] instead of aborting.
//!
//! ```rust
//! use chunk_pool::PoolAllocator;
//! use chunk_vec::PoolVec;
//!
//! let allocator = PoolAllocator::<&str>::new().unwrap();
//!
//! let mut words = PoolVec::new_in(allocator.clone());
//! words.extend_from_slice(&["pool", "backed"]).unwrap();
//! words.insert(1, "-").unwrap();
//!
//! assert_eq!(words.concat(), "pool-backed");
//!
//! // A second array can draw from the same pool.
//! let mut more = PoolVec::new_in(allocator);
//! more.push("array").unwrap();
//! assert!(more.allocator() == words.allocator());
//! ```

mod pool_vec;

pub use pool_vec::PoolVec;
