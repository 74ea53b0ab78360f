//! `WakeQueue`: sparse timer queue keyed by virtual instant.
//!
//! Suspended tasks register the instant at which they need attention next.
//! The scheduler pops the earliest bucket, advances the clock to it and wakes
//! everything in the bucket, so the cost of a step is proportional to the
//! number of timers due rather than the number of live tasks.
//!
//! Entries pushed for the same instant come back in push order.  That is the
//! tie-break rule for simultaneous timeouts.
//!
//! # Performance note
//!
//! `BTreeMap` gives O(log W) insert and O(log W) pop where W = number of
//! distinct instants currently enqueued.  Stage durations are rounded to
//! 0.01 min, so many timers share an instant and W stays small.

use std::collections::BTreeMap;

use mc_core::SimTime;

/// A priority queue mapping virtual instants → entries due at that instant.
pub struct WakeQueue<T> {
    inner: BTreeMap<SimTime, Vec<T>>,
    /// Cached total entry count for O(1) `len()`.
    total: usize,
}

impl<T> Default for WakeQueue<T> {
    fn default() -> Self {
        Self { inner: BTreeMap::new(), total: 0 }
    }
}

impl<T> WakeQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `entry` at `at`.
    pub fn push(&mut self, at: SimTime, entry: T) {
        self.inner.entry(at).or_default().push(entry);
        self.total += 1;
    }

    /// Remove and return the earliest bucket.
    pub fn pop_next(&mut self) -> Option<(SimTime, Vec<T>)> {
        let (at, entries) = self.inner.pop_first()?;
        self.total -= entries.len();
        Some((at, entries))
    }

    /// The earliest instant with at least one queued entry, or `None` if empty.
    pub fn next_time(&self) -> Option<SimTime> {
        self.inner.keys().next().copied()
    }

    /// Total number of (instant, entry) pairs across all future instants.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct future instants that have at least one entry.
    pub fn time_count(&self) -> usize {
        self.inner.len()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
        self.total = 0;
    }
}
