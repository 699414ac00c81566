use std::num::NonZero;

use new_zealand::nz;

use crate::RebindPolicy;

/// Growth granularity used when none is configured explicitly.
pub const DEFAULT_CHUNK_ELEMS: NonZero<usize> = nz!(10);

/// The policy a [`PoolAllocator`][crate::PoolAllocator] applies to its pool.
///
/// Set via [`PoolAllocatorBuilder`][crate::PoolAllocatorBuilder] and shared by every clone of
/// the allocator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PoolConfig {
    pub(crate) chunk_elems: usize,
    pub(crate) expandable: bool,
    pub(crate) per_element_free: bool,
    pub(crate) rebind_policy: RebindPolicy,
}

impl PoolConfig {
    /// Number of elements in the first block and the minimum size of every block
    /// the pool grows by.
    #[must_use]
    pub fn chunk_elems(&self) -> usize {
        self.chunk_elems
    }

    /// Whether the pool may allocate more blocks once its first block is full.
    ///
    /// A non-expandable pool never holds more than one chunk of elements and refuses
    /// any single request larger than that.
    #[must_use]
    pub fn expandable(&self) -> bool {
        self.expandable
    }

    /// Whether single-element deallocations are recorded for reuse.
    ///
    /// When disabled, deallocation is a no-op and memory is only reclaimed when the
    /// whole pool is dropped.
    #[must_use]
    pub fn per_element_free(&self) -> bool {
        self.per_element_free
    }

    /// What happens when the allocator is rebound to a different element type.
    #[must_use]
    pub fn rebind_policy(&self) -> RebindPolicy {
        self.rebind_policy
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            chunk_elems: DEFAULT_CHUNK_ELEMS.get(),
            expandable: true,
            per_element_free: false,
            rebind_policy: RebindPolicy::default(),
        }
    }
}
