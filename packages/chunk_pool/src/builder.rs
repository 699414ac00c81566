use std::marker::PhantomData;

use crate::{PoolAllocator, PoolConfig, RebindPolicy, Result};

/// Builder for creating an instance of [`PoolAllocator`].
///
/// Every setting is optional. Without any settings, the pool grows in chunks of
/// [`DEFAULT_CHUNK_ELEMS`][crate::DEFAULT_CHUNK_ELEMS] elements, is expandable and does
/// not reuse released slots.
///
/// # Examples
///
/// ```
/// use chunk_pool::PoolAllocator;
///
/// let allocator = PoolAllocator::<u64>::builder()
///     .chunk_elems(64)
///     .per_element_free(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(allocator.config().chunk_elems(), 64);
/// ```
///
/// A chunk granularity of zero is rejected when building:
///
/// ```
/// use chunk_pool::{Error, PoolAllocator};
///
/// let result = PoolAllocator::<u64>::builder().chunk_elems(0).build();
/// assert_eq!(result.unwrap_err(), Error::InvalidConfiguration);
/// ```
#[must_use]
pub struct PoolAllocatorBuilder<T> {
    config: PoolConfig,

    _item: PhantomData<fn() -> T>,
}

impl<T> PoolAllocatorBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            config: PoolConfig::default(),
            _item: PhantomData,
        }
    }

    /// Sets the number of elements in the first block and the minimum size of every block
    /// the pool grows by. Must be positive.
    pub fn chunk_elems(mut self, chunk_elems: usize) -> Self {
        self.config.chunk_elems = chunk_elems;
        self
    }

    /// Sets whether the pool may grow beyond its first block.
    pub fn expandable(mut self, expandable: bool) -> Self {
        self.config.expandable = expandable;
        self
    }

    /// Sets whether single-element deallocations are recycled through a free list.
    pub fn per_element_free(mut self, per_element_free: bool) -> Self {
        self.config.per_element_free = per_element_free;
        self
    }

    /// Sets the [rebind policy][RebindPolicy] of the allocator.
    pub fn rebind_policy(mut self, policy: RebindPolicy) -> Self {
        self.config.rebind_policy = policy;
        self
    }

    /// Creates the pool, eagerly allocating its first block, and returns an allocator
    /// attached to it.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`][crate::Error::InvalidConfiguration] if the chunk
    /// granularity is zero, [`Error::OutOfMemory`][crate::Error::OutOfMemory] if the first
    /// block cannot be allocated and
    /// [`Error::SizeLimitExceeded`][crate::Error::SizeLimitExceeded] if the first block
    /// would be too large to represent.
    pub fn build(self) -> Result<PoolAllocator<T>> {
        PoolAllocator::from_config(self.config)
    }
}

impl<T> std::fmt::Debug for PoolAllocatorBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolAllocatorBuilder")
            .field("item_type", &std::any::type_name::<T>())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn builder_new_creates_default_config() {
        let builder = PoolAllocatorBuilder::<u32>::new();

        assert_eq!(builder.config, PoolConfig::default());
    }

    #[test]
    fn settings_are_applied() {
        let allocator = PoolAllocatorBuilder::<u32>::new()
            .chunk_elems(3)
            .expandable(false)
            .per_element_free(true)
            .rebind_policy(RebindPolicy::ShareCompatible)
            .build()
            .unwrap();

        let config = allocator.config();
        assert_eq!(config.chunk_elems(), 3);
        assert!(!config.expandable());
        assert!(config.per_element_free());
        assert_eq!(config.rebind_policy(), RebindPolicy::ShareCompatible);
    }

    #[test]
    fn settings_can_be_overridden() {
        let builder = PoolAllocatorBuilder::<u32>::new()
            .chunk_elems(3)
            .chunk_elems(7)
            .expandable(false)
            .expandable(true);

        assert_eq!(builder.config.chunk_elems, 7);
        assert!(builder.config.expandable);
    }

    #[test]
    fn zero_chunk_is_rejected() {
        let result = PoolAllocatorBuilder::<u32>::new().chunk_elems(0).build();

        assert_eq!(result.unwrap_err(), Error::InvalidConfiguration);
    }

    #[test]
    fn build_creates_first_block_eagerly() {
        let allocator = PoolAllocatorBuilder::<u32>::new()
            .chunk_elems(5)
            .build()
            .unwrap();

        assert_eq!(allocator.block_capacities(), vec![5]);
    }

    #[test]
    fn builder_is_debug() {
        let builder = PoolAllocatorBuilder::<u32>::new();
        let debug_output = format!("{builder:?}");

        assert!(debug_output.contains("PoolAllocatorBuilder"));
        assert!(debug_output.contains("u32"));
    }
}
