//! The global operation queue
//!
//! One queue instance is constructed at startup and shared by every
//! queue-enabled operation. All mutation goes through the internal mutex;
//! operations poll their own position and may run once it is below the
//! concurrency ceiling. Entries stay in the queue while running and are
//! removed right before their terminal status is published, so observers
//! never see a finished operation still holding a slot.

use std::sync::{Mutex, PoisonError};
use upm_errors::OperationError;
use upm_types::OperationId;

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    id: OperationId,
    /// Pinned entries were placed by `run_next` and keep their admitted
    /// slot; other reorderings insert around them instead of displacing
    /// them out of the window
    pinned: bool,
}

/// Ordered, concurrency-limited collection of pending operations
#[derive(Debug)]
pub struct OperationQueue {
    ceiling: usize,
    entries: Mutex<Vec<QueueEntry>>,
}

impl OperationQueue {
    /// Create a queue admitting at most `ceiling` operations at once
    #[must_use]
    pub fn new(ceiling: usize) -> Self {
        Self {
            ceiling: ceiling.max(1),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// The concurrency ceiling this queue enforces
    #[must_use]
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<QueueEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append the operation, returning its position
    ///
    /// # Errors
    ///
    /// Returns `OperationError::AlreadyQueued` if the operation is already
    /// present; an operation appears in the queue at most once.
    pub fn enqueue(&self, id: OperationId) -> Result<usize, OperationError> {
        let mut entries = self.lock();
        if entries.iter().any(|entry| entry.id == id) {
            return Err(OperationError::AlreadyQueued);
        }
        entries.push(QueueEntry { id, pinned: false });
        Ok(entries.len() - 1)
    }

    /// Remove the operation; true if it was present
    pub fn remove(&self, id: OperationId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    /// Current position of the operation, front of the queue being 0
    #[must_use]
    pub fn position(&self, id: OperationId) -> Option<usize> {
        self.lock().iter().position(|entry| entry.id == id)
    }

    /// Whether the operation's position is inside the admitted window
    #[must_use]
    pub fn is_admitted(&self, id: OperationId) -> bool {
        self.position(id).is_some_and(|p| p < self.ceiling)
    }

    /// Move the operation to the front, ahead of everything not running
    pub fn skip_queue(&self, id: OperationId) {
        let mut entries = self.lock();
        let Some(index) = entries.iter().position(|entry| entry.id == id) else {
            return;
        };
        let entry = entries.remove(index);
        let target = Self::insertion_point(&entries, 0);
        entries.insert(target, entry);
    }

    /// Insert the operation right after the admitted slots
    ///
    /// The move and the eviction pin happen under one lock, so a
    /// concurrent reordering cannot bump the operation back out while it
    /// is being placed.
    pub fn run_next(&self, id: OperationId) {
        let mut entries = self.lock();
        let Some(index) = entries.iter().position(|entry| entry.id == id) else {
            return;
        };
        let mut entry = entries.remove(index);
        entry.pinned = true;
        let target = Self::insertion_point(&entries, self.ceiling.min(entries.len()));
        entries.insert(target, entry);
    }

    /// Move the operation to the end of the queue
    pub fn back_of_queue(&self, id: OperationId) {
        let mut entries = self.lock();
        let Some(index) = entries.iter().position(|entry| entry.id == id) else {
            return;
        };
        let mut entry = entries.remove(index);
        entry.pinned = false;
        entries.push(entry);
    }

    /// Pinned entries act as a barrier: nothing may be inserted ahead of
    /// one, or it would lose the slot `run_next` promised it
    fn insertion_point(entries: &[QueueEntry], requested: usize) -> usize {
        match entries.iter().rposition(|entry| entry.pinned) {
            Some(pinned) if requested <= pinned => (pinned + 1).min(entries.len()),
            _ => requested.min(entries.len()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Ids currently queued, front first
    #[must_use]
    pub fn snapshot(&self) -> Vec<OperationId> {
        self.lock().iter().map(|entry| entry.id).collect()
    }
}
