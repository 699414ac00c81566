use std::alloc::Layout;
use std::num::NonZero;
use std::ptr::NonNull;

use crate::{Block, Error, Result, max_elements};

/// An ordered sequence of [`Block`]s with a bump cursor in the current one.
///
/// Blocks before the current index are considered fully consumed for bump allocation,
/// even if some space remains at their end. Blocks after the current index are spare
/// blocks added by [`reserve()`][Self::reserve] that have not been touched yet.
///
/// Allocation never shrinks or rearranges blocks. All memory is released together, either
/// by [`release_all()`][Self::release_all] or when the store is dropped.
#[derive(Debug)]
pub(crate) struct BlockStore {
    item_layout: Layout,

    blocks: Vec<Block>,

    /// Index of the block we are bump-allocating from. Meaningless while `blocks` is empty.
    current_index: usize,

    /// Number of elements already handed out from the current block.
    /// Never exceeds the capacity of the current block.
    bump_offset: usize,
}

impl BlockStore {
    #[must_use]
    pub(crate) fn new(item_layout: Layout) -> Self {
        Self {
            item_layout,
            blocks: Vec::new(),
            current_index: 0,
            bump_offset: 0,
        }
    }

    /// Allocates a new block for `elem_count` elements and makes it the current block.
    ///
    /// Any room left in the previous current block (and any spare blocks) is abandoned.
    /// A request for zero elements does nothing. On failure the store is unchanged.
    pub(crate) fn add_block(&mut self, elem_count: usize) -> Result<()> {
        let Some(block) = self.new_block(elem_count)? else {
            return Ok(());
        };

        self.blocks.push(block);

        // Cannot underflow - we just pushed a block.
        self.current_index = self.blocks.len().wrapping_sub(1);
        self.bump_offset = 0;

        Ok(())
    }

    /// Allocates a new block for `elem_count` elements without making it current, unless
    /// the store has no blocks at all.
    fn add_spare_block(&mut self, elem_count: usize) -> Result<()> {
        let Some(block) = self.new_block(elem_count)? else {
            return Ok(());
        };

        if self.blocks.is_empty() {
            self.current_index = 0;
            self.bump_offset = 0;
        }

        self.blocks.push(block);

        Ok(())
    }

    fn new_block(&self, elem_count: usize) -> Result<Option<Block>> {
        let Some(elem_count) = NonZero::new(elem_count) else {
            return Ok(None);
        };

        let max = max_elements(self.item_layout);

        if elem_count.get() > max {
            return Err(Error::SizeLimitExceeded {
                requested: elem_count.get(),
                max,
            });
        }

        Block::new(self.item_layout, elem_count).map(Some)
    }

    /// Whether the current block has room for `n` more elements.
    #[must_use]
    pub(crate) fn has_room(&self, n: usize) -> bool {
        self.headroom() >= n && !self.blocks.is_empty()
    }

    /// Number of elements that can still be bump-allocated from the current block.
    #[must_use]
    pub(crate) fn headroom(&self) -> usize {
        self.blocks.get(self.current_index).map_or(0, |block| {
            // Cannot underflow - the offset never exceeds the capacity.
            block.capacity().wrapping_sub(self.bump_offset)
        })
    }

    /// Total capacity of the spare blocks that follow the current block.
    #[must_use]
    pub(crate) fn spare_capacity(&self) -> usize {
        self.blocks
            .iter()
            .skip(self.current_index.saturating_add(1))
            .map(Block::capacity)
            .sum()
    }

    /// Number of elements that can be allocated without asking the system allocator
    /// for more memory, assuming every request fits in whatever block it lands in.
    #[must_use]
    pub(crate) fn available(&self) -> usize {
        self.headroom().saturating_add(self.spare_capacity())
    }

    /// Hands out `n` elements from the current block and advances the cursor past them.
    ///
    /// The caller must have ensured there is room, via [`has_room()`][Self::has_room] or by
    /// growing the store. Calling this without room is a bug in the caller and fails with
    /// [`Error::AllocationFailed`] without touching any memory.
    pub(crate) fn bump_allocate(&mut self, n: usize) -> Result<NonNull<u8>> {
        if !self.has_room(n) {
            return Err(Error::AllocationFailed {
                requested: n,
                remaining: self.headroom(),
            });
        }

        let block = self
            .blocks
            .get(self.current_index)
            .expect("has_room() guarantees a current block exists");

        let ptr = block.slot(self.bump_offset);

        // Cannot overflow - bounded by the block capacity, as checked above.
        self.bump_offset = self.bump_offset.wrapping_add(n);

        Ok(ptr)
    }

    /// Makes the next spare block current, abandoning what is left of the current one.
    ///
    /// Returns `false` if there is no spare block to move to.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Can be mutated to an infinite loop in callers.
    pub(crate) fn advance_to_spare(&mut self) -> bool {
        let next_index = self.current_index.saturating_add(1);

        if next_index >= self.blocks.len() {
            return false;
        }

        self.current_index = next_index;
        self.bump_offset = 0;
        true
    }

    /// Ensures at least `total_elems` elements can be allocated without further growth.
    ///
    /// The remaining room in the current block and all spare blocks counts towards the
    /// total. If that falls short, a spare block is added that is at least `chunk`
    /// elements large, or exactly the size of the shortfall if that is larger. This keeps
    /// bulk-reserve patterns from degenerating into one tiny system allocation per call.
    pub(crate) fn reserve(&mut self, total_elems: usize, chunk: NonZero<usize>) -> Result<()> {
        let shortfall = self.shortfall(total_elems)?;

        if shortfall == 0 {
            return Ok(());
        }

        self.add_spare_block(shortfall.max(chunk.get()))
    }

    /// How many elements short of `total_elems` the store currently is.
    ///
    /// Fails if `total_elems` can never be satisfied by this store.
    pub(crate) fn shortfall(&self, total_elems: usize) -> Result<usize> {
        let max = max_elements(self.item_layout);

        if total_elems > max {
            return Err(Error::SizeLimitExceeded {
                requested: total_elems,
                max,
            });
        }

        Ok(total_elems.saturating_sub(self.available()))
    }

    /// Releases every block. The store remains usable and may grow again.
    pub(crate) fn release_all(&mut self) {
        self.blocks.clear();
        self.current_index = 0;
        self.bump_offset = 0;
    }

    #[must_use]
    pub(crate) fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Capacity of each block, in the order the blocks were added.
    pub(crate) fn block_capacities(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks.iter().map(Block::capacity)
    }

    #[must_use]
    pub(crate) fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub(crate) fn bump_offset(&self) -> usize {
        self.bump_offset
    }

    #[must_use]
    pub(crate) fn total_capacity(&self) -> usize {
        self.block_capacities().sum()
    }

    /// Returns the index of the block that contains `ptr`, if any.
    #[must_use]
    pub(crate) fn block_index_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        self.blocks.iter().position(|block| block.contains(ptr))
    }
}

#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;

    const CHUNK: NonZero<usize> = nz!(10);

    fn store_with_block(elems: usize) -> BlockStore {
        let mut store = BlockStore::new(Layout::new::<u64>());
        store.add_block(elems).unwrap();
        store
    }

    #[test]
    fn empty_store_has_no_room() {
        let mut store = BlockStore::new(Layout::new::<u64>());

        assert!(!store.has_room(0));
        assert!(!store.has_room(1));
        assert_eq!(store.headroom(), 0);
        assert!(matches!(
            store.bump_allocate(1),
            Err(Error::AllocationFailed {
                requested: 1,
                remaining: 0
            })
        ));
    }

    #[test]
    fn add_block_zero_is_noop() {
        let mut store = BlockStore::new(Layout::new::<u64>());
        store.add_block(0).unwrap();

        assert_eq!(store.block_count(), 0);
    }

    #[test]
    fn bump_allocation_is_contiguous() {
        let mut store = store_with_block(4);

        let first = store.bump_allocate(1).unwrap();
        let second = store.bump_allocate(2).unwrap();
        let third = store.bump_allocate(1).unwrap();

        assert_eq!(second.addr().get() - first.addr().get(), 8);
        assert_eq!(third.addr().get() - second.addr().get(), 16);
        assert_eq!(store.bump_offset(), 4);
        assert!(!store.has_room(1));
    }

    #[test]
    fn bump_without_room_fails_without_moving_cursor() {
        let mut store = store_with_block(2);
        store.bump_allocate(1).unwrap();

        let result = store.bump_allocate(2);

        assert_eq!(
            result,
            Err(Error::AllocationFailed {
                requested: 2,
                remaining: 1
            })
        );
        assert_eq!(store.bump_offset(), 1);
    }

    #[test]
    fn add_block_makes_new_block_current() {
        let mut store = store_with_block(2);
        store.bump_allocate(1).unwrap();

        store.add_block(5).unwrap();

        assert_eq!(store.block_count(), 2);
        assert_eq!(store.current_index(), 1);
        assert_eq!(store.bump_offset(), 0);
        assert_eq!(store.headroom(), 5);
    }

    #[test]
    fn reserve_with_enough_headroom_is_noop() {
        let mut store = store_with_block(10);
        store.bump_allocate(3).unwrap();

        store.reserve(7, CHUNK).unwrap();

        assert_eq!(store.block_count(), 1);
        assert_eq!(store.bump_offset(), 3);
    }

    #[test]
    fn reserve_small_shortfall_adds_chunk_sized_spare() {
        let mut store = store_with_block(10);
        store.bump_allocate(8).unwrap();

        // Two elements of headroom, so we are three short.
        store.reserve(5, CHUNK).unwrap();

        assert_eq!(store.block_capacities().collect::<Vec<_>>(), vec![10, 10]);
        assert_eq!(store.current_index(), 0);
        assert_eq!(store.bump_offset(), 8);
        assert_eq!(store.available(), 12);
    }

    #[test]
    fn reserve_large_shortfall_adds_exactly_the_shortfall() {
        let mut store = store_with_block(10);

        store.reserve(35, CHUNK).unwrap();

        assert_eq!(store.block_capacities().collect::<Vec<_>>(), vec![10, 25]);
        assert_eq!(store.available(), 35);
    }

    #[test]
    fn reserve_counts_spare_blocks() {
        let mut store = store_with_block(10);
        store.reserve(30, CHUNK).unwrap();
        assert_eq!(store.block_count(), 2);

        store.reserve(30, CHUNK).unwrap();

        assert_eq!(store.block_count(), 2);
    }

    #[test]
    fn reserve_beyond_max_is_size_limit_exceeded() {
        let mut store = store_with_block(10);

        let result = store.reserve(usize::MAX, CHUNK);

        assert!(matches!(result, Err(Error::SizeLimitExceeded { .. })));
        assert_eq!(store.block_count(), 1);
    }

    #[test]
    fn advance_to_spare_moves_to_fresh_block() {
        let mut store = store_with_block(2);
        store.reserve(12, CHUNK).unwrap();
        store.bump_allocate(1).unwrap();

        assert!(store.advance_to_spare());
        assert_eq!(store.current_index(), 1);
        assert_eq!(store.bump_offset(), 0);
        assert_eq!(store.headroom(), 10);

        assert!(!store.advance_to_spare());
        assert_eq!(store.current_index(), 1);
    }

    #[test]
    fn release_all_forgets_blocks_and_cursor() {
        let mut store = store_with_block(4);
        store.bump_allocate(2).unwrap();
        store.reserve(20, CHUNK).unwrap();

        store.release_all();
        store.release_all();

        assert_eq!(store.block_count(), 0);
        assert_eq!(store.bump_offset(), 0);
        assert_eq!(store.total_capacity(), 0);
        assert!(!store.has_room(1));
    }

    #[test]
    fn reserve_after_release_creates_current_block() {
        let mut store = store_with_block(4);
        store.release_all();

        store.reserve(3, CHUNK).unwrap();

        assert_eq!(store.block_count(), 1);
        assert_eq!(store.headroom(), 10);
        assert!(store.has_room(3));
    }

    #[test]
    fn block_index_of_finds_owning_block() {
        let mut store = store_with_block(2);
        let first = store.bump_allocate(1).unwrap();
        store.add_block(2).unwrap();
        let second = store.bump_allocate(1).unwrap();

        assert_eq!(store.block_index_of(first), Some(0));
        assert_eq!(store.block_index_of(second), Some(1));
    }
}
