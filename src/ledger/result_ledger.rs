use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::inference::InferenceOutcome;

/// Bounded, append-only history of inference outcomes.
///
/// Written by the streaming session only; readers take copies.
/// Once `capacity` is reached the oldest entry is evicted on each append.
pub struct ResultLedger {
    entries: RwLock<VecDeque<InferenceOutcome>>,
    capacity: usize,
    total_appended: AtomicU64,
    evicted: AtomicU64,
}

impl ResultLedger {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
            total_appended: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        }
    }

    pub fn append(&self, outcome: InferenceOutcome) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if entries.len() == self.capacity && entries.pop_front().is_some() {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        entries.push_back(outcome);
        self.total_appended.fetch_add(1, Ordering::Relaxed);
    }

    /// Oldest first, in arrival order
    pub fn snapshot(&self) -> Vec<InferenceOutcome> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// Up to `n` entries, newest first
    pub fn recent(&self, n: usize) -> Vec<InferenceOutcome> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .rev()
            .take(n)
            .cloned()
            .collect()
    }

    pub fn latest(&self) -> Option<InferenceOutcome> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .back()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends since creation, including evicted entries
    pub fn total_appended(&self) -> u64 {
        self.total_appended.load(Ordering::Relaxed)
    }

    /// Entries dropped to make room for newer ones
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }
}

impl Default for ResultLedger {
    fn default() -> Self {
        Self::new(500)
    }
}
