/// A point-in-time snapshot of the bookkeeping of one pool.
///
/// Obtained from [`PoolAllocator::stats()`][crate::PoolAllocator::stats]. The snapshot does
/// not change when the pool does; take a new one to observe later state.
///
/// # Example
///
/// ```rust
/// use chunk_pool::PoolAllocator;
///
/// let allocator = PoolAllocator::<u64>::builder().chunk_elems(8).build().unwrap();
///
/// let stats = allocator.stats().unwrap();
/// assert_eq!(stats.block_count(), 1);
/// assert_eq!(stats.headroom(), 8);
///
/// let _slot = allocator.allocate(3).unwrap();
///
/// let stats = allocator.stats().unwrap();
/// assert_eq!(stats.bump_offset(), 3);
/// assert_eq!(stats.headroom(), 5);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PoolStats {
    pub(crate) chunk_elems: usize,
    pub(crate) block_count: usize,
    pub(crate) current_block_index: usize,
    pub(crate) bump_offset: usize,
    pub(crate) headroom: usize,
    pub(crate) spare_capacity: usize,
    pub(crate) total_capacity: usize,
    pub(crate) free_slots: usize,
}

impl PoolStats {
    /// The configured growth granularity of the pool, in elements.
    #[must_use]
    pub fn chunk_elems(&self) -> usize {
        self.chunk_elems
    }

    /// Number of blocks the pool has obtained from the system allocator.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Index of the block that bump allocation currently draws from.
    #[must_use]
    pub fn current_block_index(&self) -> usize {
        self.current_block_index
    }

    /// Number of elements already handed out from the current block.
    #[must_use]
    pub fn bump_offset(&self) -> usize {
        self.bump_offset
    }

    /// Number of elements that can still be bump-allocated from the current block.
    #[must_use]
    pub fn headroom(&self) -> usize {
        self.headroom
    }

    /// Capacity of blocks reserved in advance that bump allocation has not reached yet.
    #[must_use]
    pub fn spare_capacity(&self) -> usize {
        self.spare_capacity
    }

    /// Combined capacity of all blocks, used or not.
    #[must_use]
    pub fn total_capacity(&self) -> usize {
        self.total_capacity
    }

    /// Number of released single-element slots waiting to be reused.
    #[must_use]
    pub fn free_slots(&self) -> usize {
        self.free_slots
    }
}
