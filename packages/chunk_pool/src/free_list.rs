use std::ptr::NonNull;

/// A stack of released single-element slots, consulted before bump-allocating.
///
/// The list does not validate what is pushed into it. Only addresses previously handed
/// out by the single-element allocation path of the same pool may be recorded here,
/// otherwise later allocations will return memory the pool does not own.
///
/// Slots are reused last-released-first. Callers must not rely on that order.
#[derive(Debug, Default)]
pub(crate) struct FreeList {
    slots: Vec<NonNull<u8>>,
}

impl FreeList {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, slot: NonNull<u8>) {
        self.slots.push(slot);
    }

    /// Takes one previously released slot, if any exist.
    #[must_use]
    pub(crate) fn pop(&mut self) -> Option<NonNull<u8>> {
        self.slots.pop()
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }
}
