//! Processing latency accumulator
//!
//! Sums per-ingestion durations in nanoseconds and reports the average in
//! whole microseconds, truncated.

use serde::Serialize;
use std::time::Duration;

/// Accumulated processing time across recorded ingestions
#[derive(Debug, Clone, Default)]
pub struct LatencyTracker {
    total_ns: u128,
    count: u64,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one measured duration
    pub fn record_duration(&mut self, ns: u64) {
        self.total_ns += u128::from(ns);
        self.count += 1;
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.record_duration(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX));
    }

    /// Average microseconds per recorded event, `None` when nothing was recorded
    pub fn report(&self) -> Option<LatencyReport> {
        if self.count == 0 {
            return None;
        }

        let average_us = self.total_ns / (u128::from(self.count) * 1000);
        Some(LatencyReport {
            average_us: u64::try_from(average_us).unwrap_or(u64::MAX),
            samples: self.count,
        })
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Final latency figure emitted at teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatencyReport {
    /// Truncated average per accepted update, in microseconds
    pub average_us: u64,
    /// Number of updates the average covers
    pub samples: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tracker_reports_nothing() {
        let tracker = LatencyTracker::new();
        assert!(tracker.report().is_none());
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn test_average_truncates() {
        let mut tracker = LatencyTracker::new();
        tracker.record_duration(1_500);
        tracker.record_duration(2_999);
        tracker.record_duration(700);

        // 5199 ns / 3000 = 1.733 -> 1
        let report = tracker.report().unwrap();
        assert_eq!(report.average_us, 1);
        assert_eq!(report.samples, 3);
    }

    #[test]
    fn test_sub_microsecond_average_is_zero() {
        let mut tracker = LatencyTracker::new();
        for _ in 0..20 {
            tracker.record_duration(999);
        }
        assert_eq!(tracker.report().unwrap().average_us, 0);
    }

    #[test]
    fn test_record_duration_from_std() {
        let mut tracker = LatencyTracker::new();
        tracker.record(Duration::from_micros(40));
        tracker.record(Duration::from_micros(20));

        let report = tracker.report().unwrap();
        assert_eq!(report.average_us, 30);
        assert_eq!(report.samples, 2);
    }
}
