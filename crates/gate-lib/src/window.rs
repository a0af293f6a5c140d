//! Fixed-capacity sliding window of samples
//!
//! A ring buffer that keeps the most recent samples in chronological order.
//! Once full, every push overwrites the oldest slot and advances the start
//! pointer, so the window always holds the last `capacity` accepted samples.

use std::iter::FusedIterator;

/// Default number of samples kept in the window
pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// Ring buffer holding the most recent samples
#[derive(Debug, Clone)]
pub struct CircularWindow {
    /// Backing storage, allocated once at `capacity`
    values: Vec<i64>,
    /// Index of the logically oldest value
    start: usize,
    /// Number of live values
    len: usize,
}

impl CircularWindow {
    /// Create an empty window holding at most `capacity` samples.
    ///
    /// `capacity` must be non-zero, the same rule `GateConfig::validate`
    /// applies to `window_size`.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "window capacity must be non-zero");
        Self {
            values: vec![0; capacity.max(1)],
            start: 0,
            len: 0,
        }
    }

    /// Admit a value, evicting the oldest one when the window is full
    pub fn push(&mut self, value: i64) {
        let capacity = self.capacity();

        if self.len < capacity {
            let slot = (self.start + self.len) % capacity;
            self.values[slot] = value;
            self.len += 1;
        } else {
            self.values[self.start] = value;
            self.start = (self.start + 1) % capacity;
        }
    }

    /// Iterate over the current values, oldest first
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            window: self,
            offset: 0,
        }
    }

    /// Copy the current values into a vector, oldest first
    pub fn to_vec(&self) -> Vec<i64> {
        self.snapshot().collect()
    }

    /// Number of values currently held
    pub fn size(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once the warm-up period is over
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }
}

impl Default for CircularWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

/// Borrowing iterator over a window in chronological order.
///
/// Clones are independent cursors over the same window, so one snapshot can
/// be walked twice (mean pass, then deviation pass).
#[derive(Debug, Clone)]
pub struct Snapshot<'a> {
    window: &'a CircularWindow,
    offset: usize,
}

impl Iterator for Snapshot<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        if self.offset >= self.window.len {
            return None;
        }

        let slot = (self.window.start + self.offset) % self.window.capacity();
        self.offset += 1;
        Some(self.window.values[slot])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.window.len - self.offset;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Snapshot<'_> {}

impl FusedIterator for Snapshot<'_> {}
