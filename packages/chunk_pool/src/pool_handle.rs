use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use crate::PoolState;

/// A shared reference to the state of one pool.
///
/// Any number of handles may refer to the same [`PoolState`]. The state is dropped - and all
/// of its blocks released - the moment the last handle referring to it is dropped or
/// [reset][Self::reset]. Teardown is deterministic: there is no deferred or traced cleanup.
///
/// # Thread safety
///
/// Handles are neither [`Send`] nor [`Sync`]. A pool is owned by one thread and is not
/// reentrant; callers needing cross-thread access must synchronize externally around
/// something that owns the pool.
#[derive(Clone, Debug, Default)]
pub(crate) struct PoolHandle {
    state: Option<Rc<RefCell<PoolState>>>,
}

impl PoolHandle {
    #[must_use]
    pub(crate) fn new(state: PoolState) -> Self {
        Self {
            state: Some(Rc::new(RefCell::new(state))),
        }
    }

    /// A handle that does not refer to any pool.
    #[must_use]
    pub(crate) fn detached() -> Self {
        Self { state: None }
    }

    /// Whether this handle still refers to a pool.
    #[must_use]
    pub(crate) fn valid(&self) -> bool {
        self.state.is_some()
    }

    /// Drops this handle's reference to the pool, leaving sibling handles untouched.
    ///
    /// If this was the last reference, the pool is torn down immediately.
    pub(crate) fn reset(&mut self) {
        self.state = None;
    }

    /// Exclusive access to the pool state for the duration of one operation.
    ///
    /// Returns `None` if the handle has been reset.
    ///
    /// # Panics
    ///
    /// Panics if the pool is already being accessed, which can only happen if a pool
    /// operation is reentered.
    #[must_use]
    pub(crate) fn state(&self) -> Option<RefMut<'_, PoolState>> {
        self.state.as_deref().map(RefCell::borrow_mut)
    }

    /// Whether both handles refer to the same pool. Two detached handles are considered
    /// to refer to the same (absent) pool.
    #[must_use]
    pub(crate) fn same_pool(&self, other: &Self) -> bool {
        match (&self.state, &other.state) {
            (Some(ours), Some(theirs)) => Rc::ptr_eq(ours, theirs),
            (None, None) => true,
            _ => false,
        }
    }

    /// Number of handles currently sharing the pool, zero if detached.
    #[must_use]
    pub(crate) fn strong_count(&self) -> usize {
        self.state.as_ref().map_or(0, Rc::strong_count)
    }
}
