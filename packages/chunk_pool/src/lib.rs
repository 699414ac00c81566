//! A chunked bump allocator for containers that allocate one element or node at a time.
//!
//! This crate provides [`PoolAllocator<T>`], which hands out storage for elements of `T` from
//! large blocks obtained from the system allocator in chunks, amortizing the cost of
//! allocation across many elements. Single-element slots can optionally be recycled through a
//! free list.
//!
//! # Key Features
//!
//! - **Bump allocation**: Allocation advances a cursor within the current block, O(1)
//! - **Chunked growth**: Blocks are never smaller than the configured chunk granularity
//! - **Shared pools**: Clones of an allocator share one pool and compare equal, as containers
//!   that copy their allocator expect
//! - **Deterministic teardown**: The pool releases all its blocks the moment the last
//!   allocator attached to it goes away
//! - **Slot recycling**: Optional reuse of released single-element slots
//! - **Fixed-size pools**: Optionally refuse to grow beyond the first block
//! - **Explicit failures**: Every allocation failure is reported as an [`Error`]
//!
//! # Memory Reclamation
//!
//! The pool never returns memory to the system before it is torn down. Multi-element ranges
//! passed to [`deallocate()`][PoolAllocator::deallocate] are simply forgotten; single-element
//! slots are recycled only when per-element free is enabled.
//!
//! # Thread Safety
//!
//! Pools are designed for exclusive use by one container or arena on one thread.
//! [`PoolAllocator`] is neither [`Send`] nor [`Sync`] and its operations are not reentrant.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```rust
//! use chunk_pool::PoolAllocator;
//!
//! let allocator = PoolAllocator::<u32>::builder().chunk_elems(10).build().unwrap();
//!
//! let first = allocator.allocate(1).unwrap();
//! let second = allocator.allocate(1).unwrap();
//!
//! // Consecutive allocations are adjacent within a block.
//! // SAFETY: Both pointers come from the same block.
//! assert_eq!(unsafe { second.offset_from(first) }, 1);
//!
//! // SAFETY: The storage was just allocated for one u32 each.
//! unsafe {
//!     first.write(1);
//!     second.write(2);
//!     assert_eq!(first.read() + second.read(), 3);
//! }
//! ```
//!
//! ## Recycling Single-Element Slots
//!
//! ```rust
//! use chunk_pool::PoolAllocator;
//!
//! let allocator = PoolAllocator::<String>::builder()
//!     .per_element_free(true)
//!     .build()
//!     .unwrap();
//!
//! let node = allocator.allocate(1).unwrap();
//!
//! // SAFETY: The storage came from this allocator and is not used afterwards.
//! unsafe { allocator.deallocate(node, 1) };
//!
//! // The released slot is handed out again.
//! assert_eq!(allocator.allocate(1).unwrap(), node);
//! ```
//!
//! ## Sharing One Pool
//!
//! ```rust
//! use chunk_pool::PoolAllocator;
//!
//! let allocator = PoolAllocator::<u64>::new().unwrap();
//! let shared = allocator.clone();
//!
//! assert!(allocator == shared);
//!
//! shared.allocate(4).unwrap();
//! assert_eq!(allocator.stats().unwrap().bump_offset(), 4);
//! ```

mod allocator;
mod block;
mod block_store;
mod builder;
mod config;
mod error;
mod free_list;
mod pool_handle;
mod pool_state;
mod rebind_policy;
mod stats;

pub use allocator::PoolAllocator;
pub(crate) use block::*;
pub(crate) use block_store::*;
pub use builder::PoolAllocatorBuilder;
pub use config::{DEFAULT_CHUNK_ELEMS, PoolConfig};
pub use error::{Error, Result};
pub(crate) use free_list::*;
pub(crate) use pool_handle::*;
pub(crate) use pool_state::*;
pub use rebind_policy::RebindPolicy;
pub use stats::PoolStats;
