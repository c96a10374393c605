//! Bounded snapshot history.

use serde_json::Value;
use std::collections::VecDeque;

/// Ring of whole-tree snapshots, oldest first.
///
/// The newest entry always equals the current tree. Once full, pushing
/// evicts the oldest entry. The very first snapshot is kept separately so
/// reset can return to it after eviction.
#[derive(Debug, Clone)]
pub(crate) struct History {
    entries: VecDeque<Value>,
    capacity: usize,
    initial: Option<Value>,
}

impl History {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            initial: None,
        }
    }

    pub(crate) fn push(&mut self, snapshot: Value) {
        if self.initial.is_none() {
            self.initial = Some(snapshot.clone());
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops the newest snapshot and returns the one before it.
    /// Returns `None` (and leaves the ring alone) with one entry or fewer.
    pub(crate) fn step_back(&mut self) -> Option<Value> {
        if self.entries.len() <= 1 {
            return None;
        }
        self.entries.pop_back();
        self.entries.back().cloned()
    }

    /// Collapses the ring to the first snapshot ever recorded and returns it.
    pub(crate) fn rewind(&mut self) -> Option<Value> {
        let initial = self.initial.clone()?;
        self.entries.clear();
        self.entries.push_back(initial.clone());
        Some(initial)
    }
}
