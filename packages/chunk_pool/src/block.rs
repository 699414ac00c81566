use std::alloc::{Layout, alloc, dealloc};
use std::num::NonZero;
use std::ptr::{self, NonNull};

use crate::{Error, Result};

/// The largest number of elements of the given layout that can ever be requested
/// in one allocation.
///
/// This is bounded by the largest allocation Rust permits (`isize::MAX` bytes). Zero-sized
/// items never consume memory, so any count is representable for them.
#[must_use]
#[expect(
    clippy::cast_sign_loss,
    reason = "isize::MAX is positive, so the cast is lossless"
)]
pub(crate) fn max_elements(item_layout: Layout) -> usize {
    let stride = item_layout.pad_to_align().size();

    (isize::MAX as usize)
        .checked_div(stride)
        .unwrap_or(usize::MAX)
}

/// One contiguous region of raw memory, sized to hold a fixed number of elements
/// of a fixed layout.
///
/// The block owns its memory exclusively and releases it when dropped. It never
/// creates references to the memory it owns, so callers may hand out pointers into
/// it freely.
#[derive(Debug)]
pub(crate) struct Block {
    /// Base address of the block. For zero-sized items this is a dangling but
    /// well-aligned pointer that was never obtained from the system allocator.
    ptr: NonNull<u8>,

    /// Number of elements the block can hold.
    capacity: NonZero<usize>,

    /// Distance in bytes between consecutive element slots.
    stride: usize,

    /// The layout the memory was allocated with, required for deallocation.
    /// Has zero size for zero-sized items, in which case nothing was allocated.
    memory_layout: Layout,
}

impl Block {
    /// Allocates a new block for `capacity` elements of `item_layout`.
    ///
    /// Fails with [`Error::SizeLimitExceeded`] if the total size of the block cannot be
    /// represented and with [`Error::OutOfMemory`] if the system allocator refuses the
    /// request. No memory is held on failure.
    pub(crate) fn new(item_layout: Layout, capacity: NonZero<usize>) -> Result<Self> {
        let item_layout = item_layout.pad_to_align();
        let stride = item_layout.size();

        let size_limit_exceeded = || Error::SizeLimitExceeded {
            requested: capacity.get(),
            max: max_elements(item_layout),
        };

        let size = stride
            .checked_mul(capacity.get())
            .ok_or_else(size_limit_exceeded)?;

        let memory_layout = Layout::from_size_align(size, item_layout.align())
            .map_err(|_layout_error| size_limit_exceeded())?;

        let ptr = if size == 0 {
            NonNull::new(ptr::without_provenance_mut::<u8>(item_layout.align()))
                .expect("alignment is never zero")
        } else {
            // SAFETY: The layout has a non-zero size, which is the only requirement of alloc().
            let raw = unsafe { alloc(memory_layout) };

            NonNull::new(raw).ok_or(Error::OutOfMemory {
                requested: capacity.get(),
            })?
        };

        Ok(Self {
            ptr,
            capacity,
            stride,
            memory_layout,
        })
    }

    /// Number of elements the block can hold.
    #[must_use]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Returns the address of the element slot at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is beyond the end of the block. An index equal to the capacity is
    /// permitted and yields the one-past-the-end address.
    #[must_use]
    pub(crate) fn slot(&self, index: usize) -> NonNull<u8> {
        assert!(
            index <= self.capacity.get(),
            "slot index {index} out of bounds of block with capacity {}",
            self.capacity
        );

        // Cannot overflow because the whole block fits in the address space.
        let offset = index.wrapping_mul(self.stride);

        // SAFETY: The offset is within the allocation (or one past its end) as verified
        // above, so the resulting pointer stays in bounds of the same allocated object.
        unsafe { self.ptr.byte_add(offset) }
    }

    /// Whether `ptr` points at an element slot inside this block.
    #[must_use]
    pub(crate) fn contains(&self, ptr: NonNull<u8>) -> bool {
        if self.stride == 0 {
            return ptr == self.ptr;
        }

        let start = self.ptr.addr().get();
        let address = ptr.addr().get();

        // Cannot overflow because the whole block fits in the address space.
        let end = start.wrapping_add(self.memory_layout.size());

        let is_aligned_to_slot = address.wrapping_sub(start) % self.stride == 0;

        address >= start && address < end && is_aligned_to_slot
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        if self.memory_layout.size() == 0 {
            return;
        }

        // SAFETY: We allocated this memory in new() with exactly this layout and
        // nothing else deallocates it.
        unsafe {
            dealloc(self.ptr.as_ptr(), self.memory_layout);
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::undocumented_unsafe_blocks,
    clippy::indexing_slicing,
    reason = "test code doesn't need the same safety rigor as production code"
)]
mod tests {
    use new_zealand::nz;

    use super::*;

    #[test]
    fn slots_are_contiguous() {
        let block = Block::new(Layout::new::<u64>(), nz!(4)).unwrap();

        assert_eq!(block.capacity(), 4);

        for index in 0..4 {
            let expected = block.slot(0).addr().get() + index * size_of::<u64>();
            assert_eq!(block.slot(index).addr().get(), expected);
        }
    }

    #[test]
    fn slots_are_writable() {
        let block = Block::new(Layout::new::<u32>(), nz!(3)).unwrap();

        for index in 0..3 {
            unsafe {
                block.slot(index).cast::<u32>().write(u32::try_from(index).unwrap());
            }
        }

        for index in 0..3 {
            let value = unsafe { block.slot(index).cast::<u32>().read() };
            assert_eq!(value, u32::try_from(index).unwrap());
        }
    }

    #[test]
    fn slots_respect_alignment() {
        let layout = Layout::from_size_align(8, 64).unwrap();
        let block = Block::new(layout, nz!(3)).unwrap();

        for index in 0..3 {
            assert_eq!(block.slot(index).addr().get() % 64, 0);
        }
    }

    #[test]
    #[should_panic]
    fn slot_out_of_bounds_panics() {
        let block = Block::new(Layout::new::<u8>(), nz!(2)).unwrap();
        _ = block.slot(3);
    }

    #[test]
    fn contains_only_own_slots() {
        let block = Block::new(Layout::new::<u64>(), nz!(2)).unwrap();
        let other = Block::new(Layout::new::<u64>(), nz!(2)).unwrap();

        assert!(block.contains(block.slot(0)));
        assert!(block.contains(block.slot(1)));
        assert!(!block.contains(block.slot(2)));
        assert!(!block.contains(other.slot(0)));

        let misaligned = unsafe { block.slot(0).byte_add(1) };
        assert!(!block.contains(misaligned));
    }

    #[test]
    fn zero_sized_items_do_not_allocate() {
        let block = Block::new(Layout::new::<()>(), nz!(1000)).unwrap();

        assert_eq!(block.capacity(), 1000);
        assert_eq!(block.slot(0), block.slot(999));
    }

    #[test]
    fn oversized_block_is_size_limit_exceeded() {
        let result = Block::new(Layout::new::<u64>(), NonZero::new(usize::MAX).unwrap());

        assert!(matches!(result, Err(Error::SizeLimitExceeded { .. })));
    }

    #[test]
    fn max_elements_accounts_for_item_size() {
        let max = max_elements(Layout::new::<u64>());

        assert_eq!(max, isize::MAX as usize / 8);
        assert_eq!(max_elements(Layout::new::<()>()), usize::MAX);
    }
}
