use std::alloc::Layout;
use std::num::NonZero;
use std::ptr::NonNull;

use crate::{BlockStore, Error, FreeList, PoolStats, Result};

/// The single owner of a pool's memory: its blocks and its free list.
///
/// There is exactly one `PoolState` per logical pool. It deliberately does not implement
/// [`Clone`] - a copy would split one pool into two that both believe they own the same
/// blocks. Sharing happens one level up, through [`PoolHandle`][crate::PoolHandle].
///
/// All blocks are released when the state is dropped, regardless of whether anything
/// still points into them.
#[derive(Debug)]
pub(crate) struct PoolState {
    blocks: BlockStore,
    free_list: FreeList,

    /// Minimum number of elements in each block the pool grows by.
    chunk_elems: NonZero<usize>,

    item_layout: Layout,
}

impl PoolState {
    /// Creates the pool and eagerly allocates its first block of `chunk_elems` elements.
    ///
    /// Fails with [`Error::InvalidConfiguration`] if `chunk_elems` is zero.
    pub(crate) fn new(item_layout: Layout, chunk_elems: usize) -> Result<Self> {
        let chunk_elems = NonZero::new(chunk_elems).ok_or(Error::InvalidConfiguration)?;

        let mut blocks = BlockStore::new(item_layout);
        blocks.add_block(chunk_elems.get())?;

        Ok(Self {
            blocks,
            free_list: FreeList::new(),
            chunk_elems,
            item_layout,
        })
    }

    #[must_use]
    pub(crate) fn chunk_elems(&self) -> NonZero<usize> {
        self.chunk_elems
    }

    #[must_use]
    pub(crate) fn item_layout(&self) -> Layout {
        self.item_layout
    }

    /// Bump-allocates `n` elements, moving on to a spare block or growing by
    /// `max(chunk_elems, n)` elements if the current block is too full.
    ///
    /// Only fails if the system allocator cannot provide a new block (or the request is
    /// too large to ever satisfy), in which case the pool is left as it was.
    pub(crate) fn allocate_or_grow(&mut self, n: usize) -> Result<NonNull<u8>> {
        if let Some(ptr) = self.allocate_from_existing(n)? {
            return Ok(ptr);
        }

        self.blocks.add_block(n.max(self.chunk_elems.get()))?;
        self.blocks.bump_allocate(n)
    }

    /// Bump-allocates `n` elements from blocks the pool already owns.
    ///
    /// Fails with [`Error::OutOfMemory`] if no block has room, without growing.
    pub(crate) fn allocate_fixed(&mut self, n: usize) -> Result<NonNull<u8>> {
        self.restore_first_block()?;

        self.allocate_from_existing(n)?
            .ok_or(Error::OutOfMemory { requested: n })
    }

    /// Re-creates the chunk-sized first block if every block has been released.
    ///
    /// A pool that is not allowed to grow would otherwise have no storage left at all.
    pub(crate) fn restore_first_block(&mut self) -> Result<()> {
        if self.blocks.block_count() == 0 {
            self.blocks.add_block(self.chunk_elems.get())?;
        }

        Ok(())
    }

    #[cfg_attr(test, mutants::skip)] // Can be mutated to an infinite loop.
    fn allocate_from_existing(&mut self, n: usize) -> Result<Option<NonNull<u8>>> {
        loop {
            if self.blocks.has_room(n) {
                return self.blocks.bump_allocate(n).map(Some);
            }

            if !self.blocks.advance_to_spare() {
                return Ok(None);
            }
        }
    }

    /// Ensures `total_elems` elements can be allocated without growing again.
    pub(crate) fn reserve(&mut self, total_elems: usize) -> Result<()> {
        self.blocks.reserve(total_elems, self.chunk_elems)
    }

    /// How many elements short of `total_elems` the pool's existing blocks are.
    pub(crate) fn shortfall(&self, total_elems: usize) -> Result<usize> {
        self.blocks.shortfall(total_elems)
    }

    pub(crate) fn push_free(&mut self, slot: NonNull<u8>) {
        self.free_list.push(slot);
    }

    #[must_use]
    pub(crate) fn pop_free(&mut self) -> Option<NonNull<u8>> {
        self.free_list.pop()
    }

    /// Releases every block and forgets every free slot.
    ///
    /// Anything previously allocated from the pool is invalidated. The pool itself remains
    /// usable: it grows again on the next allocation, or gets its first block back if it
    /// is not allowed to grow.
    pub(crate) fn release_all(&mut self) {
        self.blocks.release_all();
        self.free_list.clear();
    }

    #[must_use]
    pub(crate) fn block_capacities(&self) -> Vec<usize> {
        self.blocks.block_capacities().collect()
    }

    #[must_use]
    pub(crate) fn block_index_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        self.blocks.block_index_of(ptr)
    }

    #[must_use]
    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            chunk_elems: self.chunk_elems.get(),
            block_count: self.blocks.block_count(),
            current_block_index: self.blocks.current_index(),
            bump_offset: self.blocks.bump_offset(),
            headroom: self.blocks.headroom(),
            spare_capacity: self.blocks.spare_capacity(),
            total_capacity: self.blocks.total_capacity(),
            free_slots: self.free_list.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_pool(chunk_elems: usize) -> PoolState {
        PoolState::new(Layout::new::<u32>(), chunk_elems).unwrap()
    }

    #[test]
    fn zero_chunk_is_invalid_configuration() {
        let result = PoolState::new(Layout::new::<u32>(), 0);

        assert!(matches!(result, Err(Error::InvalidConfiguration)));
    }

    #[test]
    fn starts_with_one_chunk_sized_block() {
        for chunk_elems in [1, 2, 10, 1000] {
            let pool = u32_pool(chunk_elems);

            assert_eq!(pool.block_capacities(), vec![chunk_elems]);
            assert_eq!(pool.stats().bump_offset(), 0);
            assert_eq!(pool.stats().free_slots(), 0);
        }
    }

    #[test]
    fn grows_by_chunk_when_full() {
        let mut pool = u32_pool(4);

        for _ in 0..5 {
            pool.allocate_or_grow(1).unwrap();
        }

        assert_eq!(pool.block_capacities(), vec![4, 4]);
        assert_eq!(pool.stats().current_block_index(), 1);
        assert_eq!(pool.stats().bump_offset(), 1);
    }

    #[test]
    fn grows_by_request_when_larger_than_chunk() {
        let mut pool = u32_pool(4);

        let ptr = pool.allocate_or_grow(9).unwrap();

        assert_eq!(pool.block_capacities(), vec![4, 9]);
        assert_eq!(pool.block_index_of(ptr), Some(1));
        assert_eq!(pool.stats().headroom(), 0);
    }

    #[test]
    fn uses_spare_blocks_before_growing() {
        let mut pool = u32_pool(4);
        pool.reserve(10).unwrap();
        assert_eq!(pool.block_capacities(), vec![4, 6]);

        for _ in 0..10 {
            pool.allocate_or_grow(1).unwrap();
        }

        assert_eq!(pool.block_capacities(), vec![4, 6]);
        assert_eq!(pool.stats().headroom(), 0);
    }

    #[test]
    fn allocate_fixed_never_grows() {
        let mut pool = u32_pool(2);
        pool.allocate_fixed(2).unwrap();

        let result = pool.allocate_fixed(1);

        assert_eq!(result, Err(Error::OutOfMemory { requested: 1 }));
        assert_eq!(pool.block_capacities(), vec![2]);
    }

    #[test]
    fn failed_growth_leaves_state_unchanged() {
        let mut pool = u32_pool(4);
        pool.allocate_or_grow(1).unwrap();
        let before = pool.stats();

        let result = pool.allocate_or_grow(usize::MAX);

        assert!(matches!(result, Err(Error::SizeLimitExceeded { .. })));
        assert_eq!(pool.stats(), before);
    }

    #[test]
    fn free_slots_round_trip() {
        let mut pool = u32_pool(4);
        let ptr = pool.allocate_or_grow(1).unwrap();

        pool.push_free(ptr);
        assert_eq!(pool.stats().free_slots(), 1);

        assert_eq!(pool.pop_free(), Some(ptr));
        assert_eq!(pool.pop_free(), None);
    }

    #[test]
    fn release_all_clears_blocks_and_free_list() {
        let mut pool = u32_pool(4);
        let ptr = pool.allocate_or_grow(1).unwrap();
        pool.push_free(ptr);

        pool.release_all();

        assert_eq!(pool.stats().block_count(), 0);
        assert_eq!(pool.stats().free_slots(), 0);

        // The pool regrows on demand.
        pool.allocate_or_grow(1).unwrap();
        assert_eq!(pool.block_capacities(), vec![4]);
    }

    #[test]
    fn fixed_allocation_after_release_restores_first_block() {
        let mut pool = u32_pool(3);
        pool.allocate_fixed(3).unwrap();

        pool.release_all();
        pool.allocate_fixed(3).unwrap();

        assert_eq!(pool.block_capacities(), vec![3]);
        assert_eq!(
            pool.allocate_fixed(1),
            Err(Error::OutOfMemory { requested: 1 })
        );
    }

    #[test]
    fn restore_first_block_is_noop_while_blocks_exist() {
        let mut pool = u32_pool(3);
        pool.allocate_or_grow(5).unwrap();

        pool.restore_first_block().unwrap();

        assert_eq!(pool.block_capacities(), vec![3, 5]);
    }
}
