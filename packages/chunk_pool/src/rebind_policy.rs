/// Determines what [`PoolAllocator::rebind()`][crate::PoolAllocator::rebind] does when
/// asked for an allocator of a different element type.
///
/// By default, a rebound allocator gets a brand-new pool of its own.
///
/// # Examples
///
/// ```
/// use chunk_pool::{PoolAllocator, RebindPolicy};
///
/// let allocator = PoolAllocator::<u64>::builder()
///     .rebind_policy(RebindPolicy::ShareCompatible)
///     .build()
///     .unwrap();
///
/// // i64 fits exactly into the u64 slots of the pool, so the pool is shared.
/// let rebound = allocator.rebind::<i64>().unwrap();
/// assert!(rebound == allocator);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum RebindPolicy {
    /// The rebound allocator receives a new, independent pool with the same configuration,
    /// provided the source allocator is attached to a pool. Nothing is shared between the two
    /// and they do not compare equal. This is the default.
    ///
    /// A detached source yields a detached rebound allocator.
    #[default]
    Independent,

    /// The rebound allocator shares the pool of the source allocator, as long as the new
    /// element type has the same size as the pool's slots and does not require stricter
    /// alignment. Rebinding to any other type fails with
    /// [`Error::IncompatibleLayout`][crate::Error::IncompatibleLayout].
    ShareCompatible,
}
