use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::{
    Error, PoolAllocatorBuilder, PoolConfig, PoolHandle, PoolState, PoolStats, RebindPolicy,
    Result, max_elements,
};

/// An allocator that hands out storage for elements of type `T` from large, pre-allocated
/// blocks, for use by containers that allocate one element or node at a time.
///
/// The allocator itself is a cheap handle. Cloning it yields another allocator attached to
/// the same pool, and the pool is torn down - releasing all its blocks - when the last
/// allocator attached to it is dropped or [detached][Self::detach]. Two allocators compare
/// equal if and only if they are attached to the same pool, so storage allocated through
/// one may be deallocated through the other.
///
/// # Allocation strategy
///
/// Storage is bump-allocated from the current block of the pool. When the block is full, an
/// expandable pool moves on to a block reserved in advance via [`reserve()`][Self::reserve]
/// or allocates a new block of at least [`chunk_elems`][PoolConfig::chunk_elems] elements.
/// A non-expandable pool never grows past its first block.
///
/// Deallocation does not return memory to the system. When
/// [`per_element_free`][PoolConfig::per_element_free] is enabled, released single-element
/// slots are recycled by later single-element allocations; everything else is only
/// reclaimed when the pool itself is torn down. This keeps allocation O(1) with no
/// per-allocation bookkeeping, at the cost of never reusing multi-element ranges.
///
/// # Example
///
/// ```rust
/// use chunk_pool::PoolAllocator;
///
/// let allocator = PoolAllocator::<u64>::builder().chunk_elems(16).build().unwrap();
///
/// let ptr = allocator.allocate(4).unwrap();
///
/// // SAFETY: We just allocated storage for 4 elements.
/// unsafe {
///     for i in 0..4 {
///         ptr.add(i).write(i as u64 * 10);
///     }
///
///     assert_eq!(ptr.add(3).read(), 30);
/// }
///
/// // SAFETY: The pointer came from this allocator with the same element count.
/// unsafe { allocator.deallocate(ptr, 4) };
/// ```
///
/// # Thread safety
///
/// The allocator is neither [`Send`] nor [`Sync`]. A pool is designed for exclusive use by
/// one container or arena on one thread and is not reentrant; if it must ever be used from
/// multiple threads, that access has to be serialized by something that owns the pool.
pub struct PoolAllocator<T> {
    handle: PoolHandle,
    config: PoolConfig,

    _item: PhantomData<fn() -> T>,
}

impl<T> PoolAllocator<T> {
    /// Creates an allocator attached to a new pool with the default configuration.
    ///
    /// The first block of the pool is allocated immediately.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::OutOfMemory`] if the first block cannot be allocated.
    ///
    /// # Example
    ///
    /// ```rust
    /// use chunk_pool::{DEFAULT_CHUNK_ELEMS, PoolAllocator};
    ///
    /// let allocator = PoolAllocator::<String>::new().unwrap();
    ///
    /// assert_eq!(allocator.block_capacities(), vec![DEFAULT_CHUNK_ELEMS.get()]);
    /// ```
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Creates a builder for configuring and constructing a [`PoolAllocator`].
    pub fn builder() -> PoolAllocatorBuilder<T> {
        PoolAllocatorBuilder::new()
    }

    pub(crate) fn from_config(config: PoolConfig) -> Result<Self> {
        let state = PoolState::new(Layout::new::<T>(), config.chunk_elems)?;

        Ok(Self::with_handle(PoolHandle::new(state), config))
    }

    fn with_handle(handle: PoolHandle, config: PoolConfig) -> Self {
        Self {
            handle,
            config,
            _item: PhantomData,
        }
    }

    /// The configuration this allocator applies to its pool.
    #[must_use]
    pub fn config(&self) -> PoolConfig {
        self.config
    }

    /// The largest number of elements that can be requested in one allocation.
    #[must_use]
    pub fn max_size(&self) -> usize {
        max_elements(Layout::new::<T>())
    }

    /// Allocates storage for exactly `n` elements of `T`.
    ///
    /// The storage is uninitialized. It remains valid until the pool is torn down, even after
    /// it is passed to [`deallocate()`][Self::deallocate] - unless per-element free is enabled
    /// and `n` is 1, in which case deallocated storage may be handed out again.
    ///
    /// Requesting zero elements returns a dangling, well-aligned pointer without touching the
    /// pool. It must not be dereferenced.
    ///
    /// # Errors
    ///
    /// * [`Error::SizeLimitExceeded`] if `n` is greater than [`max_size()`][Self::max_size].
    /// * [`Error::CapacityExceeded`] if the pool is not expandable and `n` is greater than
    ///   its chunk size.
    /// * [`Error::OutOfMemory`] if the pool is not expandable and its block is full, or if
    ///   the system allocator cannot provide a new block. The pool remains usable.
    /// * [`Error::PoolReleased`] if the allocator has been [detached][Self::detach].
    ///
    /// Failed allocations leave the pool unchanged.
    ///
    /// # Panics
    ///
    /// Panics if called while another operation on the same pool is in progress, which is
    /// only possible through reentrancy.
    ///
    /// # Example
    ///
    /// ```rust
    /// use chunk_pool::{Error, PoolAllocator};
    ///
    /// let allocator = PoolAllocator::<u32>::builder()
    ///     .chunk_elems(4)
    ///     .expandable(false)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert!(allocator.allocate(4).is_ok());
    /// assert_eq!(
    ///     allocator.allocate(5),
    ///     Err(Error::CapacityExceeded { requested: 5, chunk: 4 })
    /// );
    /// assert_eq!(
    ///     allocator.allocate(1),
    ///     Err(Error::OutOfMemory { requested: 1 })
    /// );
    /// ```
    pub fn allocate(&self, n: usize) -> Result<NonNull<T>> {
        if n == 0 {
            return Ok(NonNull::dangling());
        }

        let max = self.max_size();

        if n > max {
            return Err(Error::SizeLimitExceeded { requested: n, max });
        }

        let mut state = self.handle.state().ok_or(Error::PoolReleased)?;

        let chunk = state.chunk_elems().get();

        if !self.config.expandable && n > chunk {
            return Err(Error::CapacityExceeded {
                requested: n,
                chunk,
            });
        }

        if self.config.per_element_free && n == 1 {
            if let Some(slot) = state.pop_free() {
                return Ok(slot.cast());
            }
        }

        let ptr = if self.config.expandable {
            state.allocate_or_grow(n)?
        } else {
            state.allocate_fixed(n)?
        };

        Ok(ptr.cast())
    }

    /// Releases storage previously obtained from [`allocate()`][Self::allocate].
    ///
    /// Releasing a single element with per-element free enabled makes its slot available
    /// to the next single-element allocation. In every other case this does nothing and the
    /// storage is only reclaimed when the pool is torn down. Releasing zero elements or
    /// releasing through a detached allocator does nothing.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`allocate()`][Self::allocate] with the same `n`, on
    /// this allocator or one that compares equal to it, and must not have been deallocated
    /// since. The caller must not access the storage after this call.
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        if n != 1 || !self.config.per_element_free {
            return;
        }

        if let Some(mut state) = self.handle.state() {
            state.push_free(ptr.cast());
        }
    }

    /// Ensures `count` elements can be allocated without the pool growing again.
    ///
    /// Room left in the current block counts towards `count`. If that is not enough, the
    /// pool allocates a spare block of at least one chunk, sized exactly to the shortfall if
    /// the shortfall exceeds a chunk.
    ///
    /// # Errors
    ///
    /// * [`Error::CapacityExceeded`] if the pool is not expandable and `count` is greater
    ///   than its chunk size.
    /// * [`Error::OutOfMemory`] if the pool is not expandable and its block does not have
    ///   `count` elements of room left.
    /// * [`Error::SizeLimitExceeded`] if `count` is greater than
    ///   [`max_size()`][Self::max_size].
    /// * [`Error::OutOfMemory`] if the system allocator cannot provide the block.
    /// * [`Error::PoolReleased`] if the allocator has been [detached][Self::detach].
    ///
    /// # Example
    ///
    /// ```rust
    /// use chunk_pool::PoolAllocator;
    ///
    /// let allocator = PoolAllocator::<u8>::builder().chunk_elems(10).build().unwrap();
    ///
    /// allocator.reserve(25).unwrap();
    /// assert_eq!(allocator.block_capacities(), vec![10, 15]);
    ///
    /// // Already satisfied - nothing changes.
    /// allocator.reserve(25).unwrap();
    /// assert_eq!(allocator.block_capacities(), vec![10, 15]);
    /// ```
    pub fn reserve(&self, count: usize) -> Result<()> {
        let mut state = self.handle.state().ok_or(Error::PoolReleased)?;

        if self.config.expandable {
            return state.reserve(count);
        }

        state.restore_first_block()?;

        if state.shortfall(count)? == 0 {
            return Ok(());
        }

        let chunk = state.chunk_elems().get();

        if count > chunk {
            Err(Error::CapacityExceeded {
                requested: count,
                chunk,
            })
        } else {
            Err(Error::OutOfMemory { requested: count })
        }
    }

    /// Returns an allocator for a different element type, as governed by the
    /// [rebind policy][RebindPolicy] of this allocator.
    ///
    /// With the default [`RebindPolicy::Independent`], the returned allocator is attached to
    /// a brand-new pool with the same configuration and shares nothing with `self`.
    ///
    /// # Errors
    ///
    /// * [`Error::IncompatibleLayout`] under [`RebindPolicy::ShareCompatible`] if `U` does not
    ///   fit the slots of the shared pool.
    /// * Any error from creating a new pool under [`RebindPolicy::Independent`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use chunk_pool::PoolAllocator;
    ///
    /// let nodes = PoolAllocator::<(u32, u32)>::new().unwrap();
    /// let values = nodes.rebind::<u64>().unwrap();
    ///
    /// // A separate pool, not a view of the same one.
    /// assert!(values != nodes);
    /// ```
    pub fn rebind<U>(&self) -> Result<PoolAllocator<U>> {
        if !self.handle.valid() {
            return Ok(PoolAllocator::with_handle(
                PoolHandle::detached(),
                self.config,
            ));
        }

        match self.config.rebind_policy {
            RebindPolicy::Independent => PoolAllocator::from_config(self.config),
            RebindPolicy::ShareCompatible => {
                let slot = self
                    .handle
                    .state()
                    .map_or_else(Layout::new::<T>, |state| state.item_layout())
                    .pad_to_align();
                let target = Layout::new::<U>();

                if target.size() != slot.size() || target.align() > slot.align() {
                    return Err(Error::IncompatibleLayout {
                        slot_size: slot.size(),
                        slot_align: slot.align(),
                        size: target.size(),
                        align: target.align(),
                    });
                }

                Ok(PoolAllocator::with_handle(self.handle.clone(), self.config))
            }
        }
    }

    /// Detaches this allocator from its pool, leaving other allocators attached to the same
    /// pool untouched.
    ///
    /// If this was the last allocator attached to the pool, the pool is torn down and all of
    /// its blocks are released immediately. Afterwards, [`allocate()`][Self::allocate] fails
    /// with [`Error::PoolReleased`] and [`deallocate()`][Self::deallocate] does nothing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use chunk_pool::PoolAllocator;
    ///
    /// let mut allocator = PoolAllocator::<u32>::new().unwrap();
    /// let sibling = allocator.clone();
    ///
    /// allocator.detach();
    ///
    /// assert!(!allocator.is_attached());
    /// assert!(sibling.is_attached());
    /// assert!(sibling.allocate(1).is_ok());
    /// ```
    pub fn detach(&mut self) {
        self.handle.reset();
    }

    /// Whether this allocator is attached to a pool.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.handle.valid()
    }

    /// Number of allocators (of any element type) attached to the same pool as this one,
    /// including this one. Zero if detached.
    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.handle.strong_count()
    }

    /// A snapshot of the pool's bookkeeping, or `None` if detached.
    #[must_use]
    pub fn stats(&self) -> Option<PoolStats> {
        self.handle.state().map(|state| state.stats())
    }

    /// Capacity of each block in the pool, in the order the blocks were allocated.
    /// Empty if detached.
    #[must_use]
    pub fn block_capacities(&self) -> Vec<usize> {
        self.handle
            .state()
            .map(|state| state.block_capacities())
            .unwrap_or_default()
    }

    /// Index of the block of this allocator's pool that `ptr` points into, if any.
    ///
    /// This only inspects addresses and never dereferences `ptr`.
    #[must_use]
    pub fn block_index_of(&self, ptr: NonNull<T>) -> Option<usize> {
        self.handle
            .state()
            .and_then(|state| state.block_index_of(ptr.cast()))
    }

    /// Releases every block of the pool and forgets all recycled slots.
    ///
    /// The pool stays attached. An expandable pool grows again on the next allocation; a
    /// non-expandable one re-creates its single chunk-sized block.
    ///
    /// # Safety
    ///
    /// All storage ever allocated from this pool becomes invalid. The caller must ensure
    /// that no allocator attached to the pool, and no container using one, accesses any
    /// previously allocated storage afterwards.
    pub unsafe fn release_all(&self) {
        if let Some(mut state) = self.handle.state() {
            state.release_all();
        }
    }
}

impl<T> Clone for PoolAllocator<T> {
    /// Returns an allocator attached to the same pool.
    fn clone(&self) -> Self {
        Self::with_handle(self.handle.clone(), self.config)
    }
}

impl<T, U> PartialEq<PoolAllocator<U>> for PoolAllocator<T> {
    fn eq(&self, other: &PoolAllocator<U>) -> bool {
        self.handle.same_pool(&other.handle)
    }
}

impl<T> Eq for PoolAllocator<T> {}

impl<T> fmt::Debug for PoolAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("item_type", &std::any::type_name::<T>())
            .field("handle", &self.handle)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::indexing_slicing,
    reason = "test code doesn't need the same safety rigor as production code"
)]
mod tests {
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(PoolAllocator<u32>: Clone, fmt::Debug, Eq);
    assert_not_impl_any!(PoolAllocator<u32>: Send, Sync);

    fn allocator(chunk: usize, expandable: bool, per_element_free: bool) -> PoolAllocator<u64> {
        PoolAllocator::builder()
            .chunk_elems(chunk)
            .expandable(expandable)
            .per_element_free(per_element_free)
            .build()
            .unwrap()
    }

    #[test]
    fn allocate_zero_changes_nothing() {
        for (expandable, per_element_free) in [(true, true), (true, false), (false, true), (false, false)] {
            let allocator = allocator(4, expandable, per_element_free);
            let slot = allocator.allocate(1).unwrap();
            unsafe { allocator.deallocate(slot, 1) };
            let before = allocator.stats().unwrap();

            let ptr = allocator.allocate(0).unwrap();

            assert_eq!(ptr, NonNull::dangling());
            assert_eq!(allocator.stats().unwrap(), before);
        }
    }

    #[test]
    fn allocate_zero_on_detached_allocator_succeeds() {
        let mut allocator = allocator(4, true, false);
        allocator.detach();

        assert!(allocator.allocate(0).is_ok());
    }

    #[test]
    fn allocate_more_than_max_is_size_limit_exceeded() {
        let allocator = allocator(4, true, false);
        let before = allocator.stats().unwrap();

        let result = allocator.allocate(allocator.max_size() + 1);

        assert_eq!(
            result,
            Err(Error::SizeLimitExceeded {
                requested: allocator.max_size() + 1,
                max: allocator.max_size()
            })
        );
        assert_eq!(allocator.stats().unwrap(), before);
    }

    #[test]
    fn non_expandable_refuses_more_than_chunk() {
        let allocator = allocator(4, false, false);
        allocator.allocate(1).unwrap();
        let before = allocator.stats().unwrap();

        let result = allocator.allocate(5);

        assert_eq!(
            result,
            Err(Error::CapacityExceeded {
                requested: 5,
                chunk: 4
            })
        );
        assert_eq!(allocator.stats().unwrap(), before);
    }

    #[test]
    fn non_expandable_runs_out_of_memory() {
        let allocator = allocator(4, false, false);
        allocator.allocate(3).unwrap();

        let result = allocator.allocate(2);

        assert_eq!(result, Err(Error::OutOfMemory { requested: 2 }));
        assert_eq!(allocator.block_capacities(), vec![4]);

        // Smaller requests still succeed.
        allocator.allocate(1).unwrap();
    }

    #[test]
    fn expandable_grows_by_larger_of_chunk_and_request() {
        let allocator = allocator(4, true, false);

        allocator.allocate(3).unwrap();
        allocator.allocate(2).unwrap();
        allocator.allocate(7).unwrap();

        assert_eq!(allocator.block_capacities(), vec![4, 4, 7]);
    }

    #[test]
    fn freed_slot_is_reused_with_per_element_free() {
        let allocator = allocator(4, true, true);
        let first = allocator.allocate(1).unwrap();
        let before = allocator.stats().unwrap();

        unsafe { allocator.deallocate(first, 1) };
        let again = allocator.allocate(1).unwrap();

        assert_eq!(again, first);
        assert_eq!(allocator.stats().unwrap(), before);
    }

    #[test]
    fn freed_slot_is_not_reused_without_per_element_free() {
        let allocator = allocator(4, true, false);
        let first = allocator.allocate(1).unwrap();

        unsafe { allocator.deallocate(first, 1) };

        for _ in 0..20 {
            assert_ne!(allocator.allocate(1).unwrap(), first);
        }
        assert_eq!(allocator.stats().unwrap().free_slots(), 0);
    }

    #[test]
    fn multi_element_deallocation_is_not_recycled() {
        let allocator = allocator(8, true, true);
        let range = allocator.allocate(2).unwrap();

        unsafe { allocator.deallocate(range, 2) };

        assert_eq!(allocator.stats().unwrap().free_slots(), 0);
        assert_ne!(allocator.allocate(1).unwrap(), range);
    }

    #[test]
    fn free_list_only_serves_single_elements() {
        let allocator = allocator(8, true, true);
        let slot = allocator.allocate(1).unwrap();
        unsafe { allocator.deallocate(slot, 1) };

        let range = allocator.allocate(2).unwrap();

        assert_ne!(range, slot);
        assert_eq!(allocator.stats().unwrap().free_slots(), 1);
    }

    #[test]
    fn non_expandable_reserve_beyond_chunk_is_refused() {
        let allocator = allocator(4, false, false);

        assert!(allocator.reserve(4).is_ok());
        assert_eq!(
            allocator.reserve(5),
            Err(Error::CapacityExceeded {
                requested: 5,
                chunk: 4
            })
        );
        assert_eq!(allocator.block_capacities(), vec![4]);
    }

    #[test]
    fn non_expandable_reserve_without_room_is_out_of_memory() {
        let allocator = allocator(4, false, false);
        allocator.allocate(1).unwrap();

        assert_eq!(allocator.reserve(3), Ok(()));
        assert_eq!(
            allocator.reserve(4),
            Err(Error::OutOfMemory { requested: 4 })
        );
        assert_eq!(
            allocator.reserve(5),
            Err(Error::CapacityExceeded {
                requested: 5,
                chunk: 4
            })
        );
        assert_eq!(allocator.block_capacities(), vec![4]);
    }

    #[test]
    fn clones_are_equal_and_share_the_pool() {
        let allocator = allocator(4, true, false);
        let clone = allocator.clone();

        assert_eq!(allocator, clone);
        assert_eq!(allocator.attached_count(), 2);

        clone.allocate(3).unwrap();
        assert_eq!(allocator.stats().unwrap().bump_offset(), 3);
    }

    #[test]
    fn separately_built_allocators_are_not_equal() {
        assert_ne!(allocator(4, true, false), allocator(4, true, false));
    }

    #[test]
    fn detached_allocator_cannot_allocate() {
        let mut allocator = allocator(4, true, true);
        let sibling = allocator.clone();
        let slot = sibling.allocate(1).unwrap();

        allocator.detach();

        assert_eq!(allocator.allocate(1), Err(Error::PoolReleased));
        assert_eq!(allocator.reserve(1), Err(Error::PoolReleased));
        assert_eq!(allocator.stats(), None);
        assert!(allocator.block_capacities().is_empty());

        // Deallocating through a detached allocator is a no-op.
        unsafe { allocator.deallocate(slot, 1) };
        assert_eq!(sibling.stats().unwrap().free_slots(), 0);
        assert_eq!(sibling.attached_count(), 1);
    }

    #[test]
    fn independent_rebind_creates_new_pool() {
        let allocator = allocator(6, false, true);
        allocator.allocate(2).unwrap();

        let rebound = allocator.rebind::<u8>().unwrap();

        assert!(rebound != allocator);
        assert_eq!(rebound.config(), allocator.config());
        assert_eq!(rebound.block_capacities(), vec![6]);
        assert_eq!(rebound.stats().unwrap().bump_offset(), 0);
        assert_eq!(allocator.attached_count(), 1);
    }

    #[test]
    fn rebind_of_detached_allocator_is_detached() {
        let mut allocator = allocator(6, true, false);
        allocator.detach();

        let rebound = allocator.rebind::<u8>().unwrap();

        assert!(!rebound.is_attached());
        assert!(rebound == allocator);
    }

    #[test]
    fn share_compatible_rebind_shares_pool() {
        let allocator = PoolAllocator::<u64>::builder()
            .per_element_free(true)
            .rebind_policy(RebindPolicy::ShareCompatible)
            .build()
            .unwrap();

        let rebound = allocator.rebind::<i64>().unwrap();
        assert!(rebound == allocator);

        let slot = allocator.allocate(1).unwrap();
        unsafe { allocator.deallocate(slot, 1) };

        assert_eq!(rebound.allocate(1).unwrap().cast::<u64>(), slot);
    }

    #[test]
    fn share_compatible_rebind_rejects_mismatched_layout() {
        let allocator = PoolAllocator::<u32>::builder()
            .rebind_policy(RebindPolicy::ShareCompatible)
            .build()
            .unwrap();

        assert_eq!(
            allocator.rebind::<u64>().unwrap_err(),
            Error::IncompatibleLayout {
                slot_size: 4,
                slot_align: 4,
                size: 8,
                align: 8
            }
        );

        // Same size, looser alignment is fine.
        assert!(allocator.rebind::<[u8; 4]>().is_ok());
    }

    #[test]
    fn allocations_are_writable() {
        let allocator = allocator(4, true, false);

        let ptrs = (0..10_u64)
            .map(|value| {
                let ptr = allocator.allocate(1).unwrap();
                unsafe { ptr.write(value) };
                ptr
            })
            .collect::<Vec<_>>();

        for (value, ptr) in (0..10_u64).zip(&ptrs) {
            assert_eq!(unsafe { ptr.read() }, value);
        }
    }

    #[test]
    fn zero_sized_types_never_fail() {
        let allocator = PoolAllocator::<()>::builder().chunk_elems(2).build().unwrap();

        assert_eq!(allocator.max_size(), usize::MAX);
        for _ in 0..100 {
            allocator.allocate(1).unwrap();
        }
    }

    #[test]
    fn release_all_keeps_pool_usable() {
        let allocator = allocator(4, true, true);
        let slot = allocator.allocate(1).unwrap();
        unsafe { allocator.deallocate(slot, 1) };

        unsafe { allocator.release_all() };

        assert_eq!(allocator.stats().unwrap().block_count(), 0);
        assert_eq!(allocator.stats().unwrap().free_slots(), 0);

        allocator.allocate(1).unwrap();
        assert_eq!(allocator.block_capacities(), vec![4]);
    }

    #[test]
    fn release_all_keeps_non_expandable_pool_usable() {
        let allocator = allocator(4, false, false);
        allocator.allocate(4).unwrap();

        unsafe { allocator.release_all() };

        assert_eq!(allocator.stats().unwrap().block_count(), 0);

        allocator.reserve(4).unwrap();
        assert_eq!(allocator.block_capacities(), vec![4]);

        allocator.allocate(4).unwrap();
        assert_eq!(
            allocator.allocate(1),
            Err(Error::OutOfMemory { requested: 1 })
        );
        assert_eq!(allocator.block_capacities(), vec![4]);
    }

    #[test]
    fn non_expandable_allocation_after_release_restores_first_block() {
        let allocator = allocator(4, false, false);

        unsafe { allocator.release_all() };

        allocator.allocate(1).unwrap();
        assert_eq!(allocator.block_capacities(), vec![4]);
    }

    #[test]
    fn allocator_is_debug() {
        let allocator = allocator(4, true, false);
        let debug_output = format!("{allocator:?}");

        assert!(debug_output.contains("PoolAllocator"));
        assert!(debug_output.contains("u64"));
    }
}
