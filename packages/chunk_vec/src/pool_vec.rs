use std::cmp::Ordering;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

use chunk_pool::{Error, PoolAllocator, Result};

/// A contiguous growable array whose storage comes from a [`PoolAllocator`].
///
/// The array only ever talks to its allocator through
/// [`allocate()`][PoolAllocator::allocate] and [`deallocate()`][PoolAllocator::deallocate];
/// it never looks inside the pool. When it runs out of capacity it doubles it, moving its
/// items to a fresh allocation.
///
/// Note that a pool never reclaims multi-element ranges, so the storage left behind by each
/// reallocation stays in the pool until the pool itself is torn down. Use
/// [`with_capacity_in()`][Self::with_capacity_in] or [`reserve()`][Self::reserve] to avoid
/// reallocating when the final size is known in advance.
///
/// # Example
///
/// ```rust
/// use chunk_pool::PoolAllocator;
/// use chunk_vec::PoolVec;
///
/// let allocator = PoolAllocator::<u32>::builder().chunk_elems(64).build().unwrap();
/// let mut items = PoolVec::new_in(allocator);
///
/// for i in 0..10 {
///     items.push(i).unwrap();
/// }
///
/// assert_eq!(items.len(), 10);
/// assert_eq!(items[3], 3);
/// assert_eq!(items.iter().sum::<u32>(), 45);
/// ```
pub struct PoolVec<T> {
    /// Start of the storage. Dangling while `capacity` is zero.
    ptr: NonNull<T>,

    /// Number of initialized items at the start of the storage.
    len: usize,

    /// Number of items the storage was allocated for.
    capacity: usize,

    allocator: PoolAllocator<T>,
}

impl<T> PoolVec<T> {
    /// Creates an empty array that allocates from `allocator` once items are added.
    #[must_use]
    pub fn new_in(allocator: PoolAllocator<T>) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            capacity: 0,
            allocator,
        }
    }

    /// Creates an empty array with storage for exactly `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns any error the allocator reports for a request of `capacity` elements.
    pub fn with_capacity_in(capacity: usize, allocator: PoolAllocator<T>) -> Result<Self> {
        let mut vec = Self::new_in(allocator);
        vec.grow_to(capacity)?;
        Ok(vec)
    }

    /// The allocator this array obtains its storage from.
    #[must_use]
    pub fn allocator(&self) -> &PoolAllocator<T> {
        &self.allocator
    }

    /// Number of items in the array.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array contains no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of items the array can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Ensures there is room for at least `additional` more items without reallocating.
    ///
    /// Unlike growth on insertion, this allocates exactly as much as requested.
    ///
    /// # Errors
    ///
    /// [`Error::SizeLimitExceeded`] if the total does not fit in `usize`, otherwise any
    /// error the allocator reports.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let required = self.required_capacity(additional)?;

        if required <= self.capacity {
            return Ok(());
        }

        self.grow_to(required)
    }

    /// Appends an item to the end of the array.
    ///
    /// # Errors
    ///
    /// Returns any error the allocator reports when the array has to grow. The item is
    /// dropped in that case and the array is unchanged.
    pub fn push(&mut self, value: T) -> Result<()> {
        self.grow_for_one_more()?;

        // SAFETY: We just ensured len < capacity, so the slot is within our storage.
        let slot = unsafe { self.ptr.add(self.len) };

        // SAFETY: The slot is past the initialized range, so nothing is overwritten.
        unsafe {
            slot.write(value);
        }

        // Cannot overflow - bounded by capacity.
        self.len = self.len.wrapping_add(1);

        Ok(())
    }

    /// Removes the last item and returns it, or `None` if the array is empty.
    pub fn pop(&mut self) -> Option<T> {
        self.len = self.len.checked_sub(1)?;

        // SAFETY: The new len is below the old len, so the slot is within our storage.
        let slot = unsafe { self.ptr.add(self.len) };

        // SAFETY: The item at the old last index was initialized and is now outside the
        // initialized range, so reading it out transfers ownership to the caller.
        Some(unsafe { slot.read() })
    }

    /// Inserts an item at `index`, shifting all items after it to the right.
    ///
    /// # Errors
    ///
    /// Returns any error the allocator reports when the array has to grow. The item is
    /// dropped in that case and the array is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        assert!(
            index <= self.len,
            "insertion index {index} out of bounds of array with length {}",
            self.len
        );

        self.grow_for_one_more()?;

        // SAFETY: index <= len < capacity, so the slot is within our storage.
        let slot = unsafe { self.ptr.add(index) };
        // SAFETY: index + 1 <= capacity, so this is at most one past the end of our storage.
        let next = unsafe { slot.add(1) };

        // SAFETY: The source range [index, len) and the destination range [index + 1, len + 1)
        // are both within our storage. ptr::copy permits the ranges to overlap.
        unsafe {
            ptr::copy(slot.as_ptr(), next.as_ptr(), self.len.wrapping_sub(index));
        }

        // SAFETY: The item that was in the slot has been moved one slot to the right.
        unsafe {
            slot.write(value);
        }

        self.len = self.len.wrapping_add(1);

        Ok(())
    }

    /// Removes and returns the item at `index`, shifting all items after it to the left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "removal index {index} out of bounds of array with length {}",
            self.len
        );

        // Cannot underflow - index < len.
        self.len = self.len.wrapping_sub(1);

        // SAFETY: index < old len <= capacity, so the slot is within our storage.
        let slot = unsafe { self.ptr.add(index) };
        // SAFETY: index + 1 <= capacity, so this is at most one past the end of our storage.
        let next = unsafe { slot.add(1) };

        // SAFETY: The item at index is initialized. Reading it out transfers ownership to the
        // caller and the copy below overwrites the slot.
        let value = unsafe { slot.read() };

        // SAFETY: The items in (index, old len) are initialized and moved one slot to the left,
        // staying within our storage. ptr::copy permits the ranges to overlap.
        unsafe {
            ptr::copy(next.as_ptr(), slot.as_ptr(), self.len.wrapping_sub(index));
        }

        value
    }

    /// Shortens the array to `len` items, dropping the rest. Does nothing if the array is
    /// already that short. Capacity is unaffected.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        let tail_len = self.len.wrapping_sub(len);

        // Shrink first so a panicking drop cannot cause a double drop.
        self.len = len;

        // SAFETY: len < old len <= capacity, so the pointer is within our storage.
        let tail_start = unsafe { self.ptr.add(len) };
        let tail = ptr::slice_from_raw_parts_mut(tail_start.as_ptr(), tail_len);

        // SAFETY: The items in [len, old len) are initialized and no longer part of the
        // initialized range, so we drop each exactly once.
        unsafe {
            ptr::drop_in_place(tail);
        }
    }

    /// Removes all items. Capacity is unaffected.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Appends every item produced by `iter`.
    ///
    /// # Errors
    ///
    /// Returns the first error the allocator reports. Items appended before the failure
    /// remain in the array.
    pub fn try_extend<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0)?;

        for value in iter {
            self.push(value)?;
        }

        Ok(())
    }

    /// Extracts a slice containing the entire array.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: The first len items are initialized and the pointer is non-null and
        // aligned, even when dangling with len == 0.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Extracts a mutable slice containing the entire array.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: The first len items are initialized and we hold an exclusive reference.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Resizes the array to `new_len` items, filling new slots with values produced by `f`
    /// or dropping surplus items.
    ///
    /// # Errors
    ///
    /// Returns any error the allocator reports when the array has to grow. Items added
    /// before the failure remain in the array.
    pub fn resize_with<F>(&mut self, new_len: usize, mut f: F) -> Result<()>
    where
        F: FnMut() -> T,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }

        // Cannot underflow - new_len > len.
        let additional = new_len.wrapping_sub(self.len);
        self.reserve(additional)?;

        while self.len < new_len {
            self.push(f())?;
        }

        Ok(())
    }

    /// Resizes the array to `new_len` items, filling new slots with `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns any error the allocator reports when the array has to grow.
    pub fn resize_default(&mut self, new_len: usize) -> Result<()>
    where
        T: Default,
    {
        self.resize_with(new_len, T::default)
    }

    /// Creates a copy of the array that allocates from the same pool.
    ///
    /// # Errors
    ///
    /// Returns any error the allocator reports.
    pub fn try_clone(&self) -> Result<Self>
    where
        T: Clone,
    {
        let mut clone = Self::with_capacity_in(self.len, self.allocator.clone())?;

        for value in self.iter() {
            clone.push(value.clone())?;
        }

        Ok(clone)
    }

    fn required_capacity(&self, additional: usize) -> Result<usize> {
        self.len
            .checked_add(additional)
            .ok_or(Error::SizeLimitExceeded {
                requested: additional,
                max: self.allocator.max_size().saturating_sub(self.len),
            })
    }

    #[cfg_attr(test, mutants::skip)] // Can be mutated to infinitely growing memory use.
    fn grow_for_one_more(&mut self) -> Result<()> {
        if self.len < self.capacity {
            return Ok(());
        }

        let required = self.required_capacity(1)?;
        let doubled = self.capacity.saturating_mul(2);

        self.grow_to(doubled.max(required))
    }

    /// Moves the items into a new allocation for exactly `new_capacity` items.
    ///
    /// On failure the array is left untouched.
    fn grow_to(&mut self, new_capacity: usize) -> Result<()> {
        debug_assert!(new_capacity >= self.len);

        if new_capacity == 0 {
            return Ok(());
        }

        let new_ptr = self.allocator.allocate(new_capacity)?;

        // SAFETY: The new storage has room for new_capacity >= len items and cannot overlap
        // with our current storage, which the pool has not reclaimed.
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), self.len);
        }

        self.release_storage();

        self.ptr = new_ptr;
        self.capacity = new_capacity;

        Ok(())
    }

    /// Returns the storage to the allocator without touching the items in it.
    fn release_storage(&mut self) {
        if self.capacity == 0 {
            return;
        }

        // SAFETY: The storage was allocated by our allocator with exactly this capacity and
        // is not used again - callers replace the pointer or drop the array right after.
        unsafe {
            self.allocator.deallocate(self.ptr, self.capacity);
        }
    }
}

impl<T> Drop for PoolVec<T> {
    fn drop(&mut self) {
        self.clear();
        self.release_storage();
    }
}

impl<T> Deref for PoolVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for PoolVec<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Clone> Clone for PoolVec<T> {
    /// Clones the array, sharing the allocator (and thus the pool) of the original.
    ///
    /// # Panics
    ///
    /// Panics if the pool cannot provide storage for the copy. Use
    /// [`try_clone()`][PoolVec::try_clone] to handle that case.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(clone) => clone,
            Err(error) => panic!("failed to allocate storage for a PoolVec clone: {error}"),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PoolVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for PoolVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for PoolVec<T> {}

impl<T: PartialOrd> PartialOrd for PoolVec<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<T: Ord> Ord for PoolVec<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<'a, T> IntoIterator for &'a PoolVec<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut PoolVec<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: Clone> PoolVec<T> {
    /// Resizes the array to `new_len` items, filling new slots with clones of `value` or
    /// dropping surplus items.
    ///
    /// # Errors
    ///
    /// Returns any error the allocator reports when the array has to grow.
    pub fn resize(&mut self, new_len: usize, value: T) -> Result<()> {
        self.resize_with(new_len, || value.clone())
    }

    /// Appends clones of every item in `values`.
    ///
    /// # Errors
    ///
    /// Returns any error the allocator reports when the array has to grow.
    pub fn extend_from_slice(&mut self, values: &[T]) -> Result<()> {
        self.try_extend(values.iter().cloned())
    }
}

#[cfg(test)]
#[allow(
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    reason = "test code doesn't need the same safety rigor as production code"
)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(PoolVec<u32>: fmt::Debug, Clone, Eq, Ord);
    assert_not_impl_any!(PoolVec<u32>: Send, Sync);

    fn allocator<T>(chunk: usize) -> PoolAllocator<T> {
        PoolAllocator::builder().chunk_elems(chunk).build().unwrap()
    }

    /// Counts how many times it has been dropped.
    #[derive(Clone, Debug)]
    struct DropCounter(Rc<Cell<usize>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn new_in_does_not_allocate() {
        let allocator = allocator::<u32>(4);
        let vec = PoolVec::new_in(allocator.clone());

        assert!(vec.is_empty());
        assert_eq!(vec.capacity(), 0);
        assert_eq!(allocator.stats().unwrap().bump_offset(), 0);
    }

    #[test]
    fn push_doubles_capacity() {
        let mut vec = PoolVec::new_in(allocator::<u32>(64));
        let mut capacities = Vec::new();

        for i in 0..9 {
            vec.push(i).unwrap();
            capacities.push(vec.capacity());
        }

        assert_eq!(capacities, vec![1, 2, 4, 4, 8, 8, 8, 8, 16]);
        assert_eq!(vec.as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn pop_returns_items_in_reverse() {
        let mut vec = PoolVec::new_in(allocator::<String>(8));
        vec.push("a".to_string()).unwrap();
        vec.push("b".to_string()).unwrap();

        assert_eq!(vec.pop().as_deref(), Some("b"));
        assert_eq!(vec.pop().as_deref(), Some("a"));
        assert_eq!(vec.pop(), None);
    }

    #[test]
    fn insert_shifts_right() {
        let mut vec = PoolVec::new_in(allocator::<u32>(8));
        vec.extend_from_slice(&[1, 2, 4]).unwrap();

        vec.insert(2, 3).unwrap();
        vec.insert(0, 0).unwrap();
        vec.insert(5, 5).unwrap();

        assert_eq!(vec.as_slice(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    #[should_panic]
    fn insert_out_of_bounds_panics() {
        let mut vec = PoolVec::new_in(allocator::<u32>(8));
        vec.insert(1, 0).unwrap();
    }

    #[test]
    fn remove_shifts_left() {
        let mut vec = PoolVec::new_in(allocator::<u32>(8));
        vec.extend_from_slice(&[0, 1, 2, 3]).unwrap();

        assert_eq!(vec.remove(1), 1);
        assert_eq!(vec.remove(2), 3);

        assert_eq!(vec.as_slice(), &[0, 2]);
    }

    #[test]
    #[should_panic]
    fn remove_out_of_bounds_panics() {
        let mut vec = PoolVec::new_in(allocator::<u32>(8));
        vec.push(1).unwrap();
        _ = vec.remove(1);
    }

    #[test]
    fn resize_grows_and_shrinks() {
        let mut vec = PoolVec::new_in(allocator::<u32>(8));

        vec.resize(3, 7).unwrap();
        assert_eq!(vec.as_slice(), &[7, 7, 7]);
        assert_eq!(vec.capacity(), 3);

        vec.resize(1, 0).unwrap();
        assert_eq!(vec.as_slice(), &[7]);
        assert_eq!(vec.capacity(), 3);
    }

    #[test]
    fn resize_default_fills_with_default_values() {
        let mut vec = PoolVec::new_in(allocator::<String>(8));
        vec.push("kept".to_string()).unwrap();

        vec.resize_default(3).unwrap();
        assert_eq!(vec.as_slice(), &["kept", "", ""]);

        vec.resize_default(1).unwrap();
        assert_eq!(vec.as_slice(), &["kept"]);
    }

    #[test]
    fn resize_with_calls_generator_for_each_new_item() {
        let mut vec = PoolVec::new_in(allocator::<u32>(8));
        let mut next = 0;

        vec.resize_with(4, || {
            next += 1;
            next
        })
        .unwrap();

        assert_eq!(vec.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn arrays_order_lexicographically() {
        let pool = allocator::<u32>(16);
        let mut short = PoolVec::new_in(pool.clone());
        let mut long = PoolVec::new_in(pool.clone());
        let mut larger = PoolVec::new_in(pool);

        short.extend_from_slice(&[1, 2]).unwrap();
        long.extend_from_slice(&[1, 2, 0]).unwrap();
        larger.extend_from_slice(&[1, 3]).unwrap();

        assert!(short < long);
        assert!(long < larger);
        assert!(short <= short.clone());
        assert!(larger > short);
        assert_eq!(short.cmp(&long), Ordering::Less);
        assert_eq!(larger.partial_cmp(&long), Some(Ordering::Greater));
    }

    #[test]
    fn reserve_allocates_exactly() {
        let allocator = allocator::<u32>(8);
        let mut vec = PoolVec::new_in(allocator.clone());

        vec.reserve(5).unwrap();
        assert_eq!(vec.capacity(), 5);

        let offset = allocator.stats().unwrap().bump_offset();
        vec.reserve(5).unwrap();
        for i in 0..5 {
            vec.push(i).unwrap();
        }

        assert_eq!(allocator.stats().unwrap().bump_offset(), offset);
    }

    #[test]
    fn reserve_overflow_is_size_limit_exceeded() {
        let mut vec = PoolVec::new_in(allocator::<u32>(8));
        vec.push(1).unwrap();

        assert!(matches!(
            vec.reserve(usize::MAX),
            Err(Error::SizeLimitExceeded { .. })
        ));
        assert_eq!(vec.as_slice(), &[1]);
    }

    #[test]
    fn failed_growth_leaves_items_intact() {
        let allocator = PoolAllocator::<u32>::builder()
            .chunk_elems(3)
            .expandable(false)
            .build()
            .unwrap();
        let mut vec = PoolVec::new_in(allocator);

        vec.push(1).unwrap();
        vec.push(2).unwrap();

        // Growing to 4 exceeds the fixed chunk of the pool.
        vec.push(3).unwrap_err();

        assert_eq!(vec.as_slice(), &[1, 2]);
        assert_eq!(vec.capacity(), 2);
    }

    #[test]
    fn clone_shares_the_pool() {
        let mut vec = PoolVec::new_in(allocator::<u32>(8));
        vec.extend_from_slice(&[1, 2, 3]).unwrap();

        let clone = vec.clone();

        assert_eq!(clone, vec);
        assert!(clone.allocator() == vec.allocator());
        assert_ne!(clone.as_ptr(), vec.as_ptr());
    }

    #[test]
    fn drop_drops_every_item_once() {
        let drops = Rc::new(Cell::new(0));

        {
            let mut vec = PoolVec::new_in(allocator::<DropCounter>(2));
            for _ in 0..5 {
                vec.push(DropCounter(Rc::clone(&drops))).unwrap();
            }

            drop(vec.remove(0));
            assert_eq!(drops.get(), 1);

            vec.truncate(2);
            assert_eq!(drops.get(), 3);
        }

        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn iterates_by_reference() {
        let mut vec = PoolVec::new_in(allocator::<u32>(8));
        vec.extend_from_slice(&[1, 2, 3]).unwrap();

        for value in &mut vec {
            *value *= 10;
        }

        let collected = (&vec).into_iter().copied().collect::<Vec<_>>();
        assert_eq!(collected, vec![10, 20, 30]);
    }

    #[test]
    fn debug_lists_items() {
        let mut vec = PoolVec::new_in(allocator::<u32>(8));
        vec.extend_from_slice(&[1, 2]).unwrap();

        assert_eq!(format!("{vec:?}"), "[1, 2]");
    }

    #[test]
    fn zero_sized_items_work() {
        let mut vec = PoolVec::new_in(allocator::<()>(2));

        for _ in 0..100 {
            vec.push(()).unwrap();
        }

        assert_eq!(vec.len(), 100);
        assert_eq!(vec.pop(), Some(()));
    }
}
