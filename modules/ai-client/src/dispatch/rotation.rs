use std::sync::atomic::{AtomicUsize, Ordering};

/// Round-robin cursor over a dispatcher's candidate models.
///
/// Every attempt advances the cursor by one, so consecutive dispatches
/// spread load across models. Share one rotation between dispatchers with
/// `Arc` to load-balance them together; give each its own for deterministic
/// tests. Ordering is relaxed: model choice is a heuristic, not a contract.
#[derive(Debug, Default)]
pub struct ModelRotation {
    next: AtomicUsize,
}

impl ModelRotation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(index: usize) -> Self {
        Self {
            next: AtomicUsize::new(index),
        }
    }

    /// Global index the next attempt will start from.
    pub fn current(&self) -> usize {
        self.next.load(Ordering::Relaxed)
    }

    /// Consume one slot, returning the index it held.
    pub(crate) fn advance(&self) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
