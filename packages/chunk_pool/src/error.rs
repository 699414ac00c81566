use thiserror::Error;

/// Errors that can occur when configuring a pool or allocating from it.
///
/// Deallocation and pool teardown never fail, so every variant here originates from
/// either construction, [`allocate()`][crate::PoolAllocator::allocate],
/// [`reserve()`][crate::PoolAllocator::reserve] or
/// [`rebind()`][crate::PoolAllocator::rebind].
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The pool was configured with a chunk granularity of zero elements.
    #[error("invalid pool configuration: chunk granularity must be positive")]
    InvalidConfiguration,

    /// The requested element count cannot be represented as a valid allocation size.
    #[error("requested {requested} elements but at most {max} can be represented")]
    SizeLimitExceeded {
        /// The number of elements that was requested.
        requested: usize,

        /// The largest element count the pool can ever satisfy.
        max: usize,
    },

    /// A non-expandable pool was asked for more elements than its fixed chunk can hold.
    #[error("requested {requested} elements from a non-expandable pool with chunk size {chunk}")]
    CapacityExceeded {
        /// The number of elements that was requested.
        requested: usize,

        /// The fixed chunk size of the pool.
        chunk: usize,
    },

    /// The system allocator could not satisfy a block allocation, or a non-expandable
    /// pool has no room left in its block.
    ///
    /// The pool remains valid and may still satisfy smaller requests.
    #[error("out of memory while allocating {requested} elements")]
    OutOfMemory {
        /// The number of elements that was requested.
        requested: usize,
    },

    /// A bump allocation was attempted without room in the current block.
    ///
    /// This indicates a bug in the caller, which must check for room or grow first.
    #[error("bump allocation of {requested} elements attempted with only {remaining} remaining")]
    AllocationFailed {
        /// The number of elements that was requested.
        requested: usize,

        /// The number of elements remaining in the current block.
        remaining: usize,
    },

    /// The allocator has been detached from its pool and can no longer allocate.
    #[error("the allocator is not attached to a pool")]
    PoolReleased,

    /// A shared rebind was requested to a type whose layout does not fit the pool's slots.
    #[error(
        "cannot share a pool of {slot_size}-byte slots (align {slot_align}) with a type of size {size} (align {align})"
    )]
    IncompatibleLayout {
        /// Size of the pool's element slot in bytes.
        slot_size: usize,

        /// Alignment of the pool's element slot in bytes.
        slot_align: usize,

        /// Size of the rebind target type in bytes.
        size: usize,

        /// Alignment of the rebind target type in bytes.
        align: usize,
    },
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
