//! Admission gate for candidate samples
//!
//! Rejects a candidate whose distance from the window mean exceeds a
//! configurable multiple of the window's standard deviation. The gate only
//! engages once the window is full; during warm-up every candidate passes.

use super::stats::WindowStats;
use crate::window::CircularWindow;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of standard deviations a sample may stray from the mean
pub const DEFAULT_STD_DEV_MULTIPLIER: u32 = 8;

/// Accept/reject decision point guarding admission into the window
#[derive(Debug, Clone, Copy)]
pub struct AnomalyGate {
    /// Number of standard deviations tolerated on either side of the mean
    pub std_dev_multiplier: u32,
}

impl AnomalyGate {
    pub fn new(std_dev_multiplier: u32) -> Self {
        Self { std_dev_multiplier }
    }

    /// Decide whether `candidate` may enter `window`
    ///
    /// Statistics are computed over the current window, excluding the
    /// candidate. The band `mean ± k·stddev` is inclusive on both ends.
    pub fn decide(&self, candidate: i64, window: &CircularWindow) -> Decision {
        if !window.is_full() {
            return Decision::Accept;
        }

        let Some(stats) = WindowStats::compute(window) else {
            return Decision::Accept;
        };

        let band = Band::around(&stats, self.std_dev_multiplier);
        let value = i128::from(candidate);

        let reason = if value < band.lower {
            RejectReason::BelowLowerBound
        } else if value > band.upper {
            RejectReason::AboveUpperBound
        } else {
            return Decision::Accept;
        };

        Decision::Reject(Rejection {
            reason,
            candidate,
            mean: stats.mean,
            std_dev: stats.std_dev,
            multiplier: self.std_dev_multiplier,
            lower_bound: band.lower,
            upper_bound: band.upper,
        })
    }
}

impl Default for AnomalyGate {
    fn default() -> Self {
        Self::new(DEFAULT_STD_DEV_MULTIPLIER)
    }
}

/// Inclusive acceptance band; i128 so `mean ± k·stddev` cannot overflow
struct Band {
    lower: i128,
    upper: i128,
}

impl Band {
    fn around(stats: &WindowStats, multiplier: u32) -> Self {
        let mean = i128::from(stats.mean);
        let spread = i128::from(multiplier) * i128::from(stats.std_dev);
        Self {
            lower: mean - spread,
            upper: mean + spread,
        }
    }
}

/// Outcome of a gate decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject(Rejection),
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }
}

/// Which side of the band the candidate fell on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    BelowLowerBound,
    AboveUpperBound,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::BelowLowerBound => "below_lower_bound",
            RejectReason::AboveUpperBound => "above_upper_bound",
        }
    }
}

/// Diagnostics for a rejected candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: RejectReason,
    /// The value that was turned away
    pub candidate: i64,
    /// Window mean observed at decision time
    pub mean: i64,
    /// Window standard deviation observed at decision time
    pub std_dev: i64,
    pub multiplier: u32,
    pub lower_bound: i128,
    pub upper_bound: i128,
}

impl Rejection {
    /// Distance from the candidate to the nearest band edge
    pub fn excess(&self) -> i128 {
        let value = i128::from(self.candidate);
        match self.reason {
            RejectReason::BelowLowerBound => self.lower_bound - value,
            RejectReason::AboveUpperBound => value - self.upper_bound,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "value {} is outside {} +- {} (k = {})",
            self.candidate, self.mean, self.std_dev, self.multiplier
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_window(values: &[i64]) -> CircularWindow {
        let mut window = CircularWindow::new(values.len());
        for v in values {
            window.push(*v);
        }
        window
    }

    /// 20 samples alternating 90/110: mean 100, stddev 10
    fn spread_window() -> CircularWindow {
        let values: Vec<i64> = (0..20).map(|i| if i % 2 == 0 { 90 } else { 110 }).collect();
        full_window(&values)
    }

    #[test]
    fn test_warm_up_accepts_anything() {
        let gate = AnomalyGate::default();
        let mut window = CircularWindow::new(20);
        for _ in 0..19 {
            window.push(10);
        }

        assert!(gate.decide(i64::MAX, &window).is_accept());
        assert!(gate.decide(i64::MIN, &window).is_accept());
    }

    #[test]
    fn test_upper_bound_is_inclusive() {
        let gate = AnomalyGate::default();
        let window = spread_window();
        let stats = WindowStats::compute(&window).unwrap();
        assert_eq!((stats.mean, stats.std_dev), (100, 10));

        assert!(gate.decide(180, &window).is_accept());

        match gate.decide(181, &window) {
            Decision::Reject(rejection) => {
                assert_eq!(rejection.reason, RejectReason::AboveUpperBound);
                assert_eq!(rejection.mean, 100);
                assert_eq!(rejection.std_dev, 10);
                assert_eq!(rejection.candidate, 181);
                assert_eq!(rejection.excess(), 1);
            }
            Decision::Accept => panic!("181 should be rejected"),
        }
    }

    #[test]
    fn test_lower_bound_is_inclusive() {
        let gate = AnomalyGate::default();
        let window = spread_window();

        assert!(gate.decide(20, &window).is_accept());

        match gate.decide(19, &window) {
            Decision::Reject(rejection) => {
                assert_eq!(rejection.reason, RejectReason::BelowLowerBound);
                assert_eq!(rejection.lower_bound, 20);
                assert_eq!(rejection.upper_bound, 180);
            }
            Decision::Accept => panic!("19 should be rejected"),
        }
    }

    #[test]
    fn test_zero_deviation_only_accepts_mean() {
        let gate = AnomalyGate::default();
        let window = full_window(&[10, 10, 10]);

        assert!(gate.decide(10, &window).is_accept());
        assert!(!gate.decide(11, &window).is_accept());
        assert!(!gate.decide(9, &window).is_accept());
        assert!(!gate.decide(1000, &window).is_accept());
    }

    #[test]
    fn test_custom_multiplier() {
        let gate = AnomalyGate::new(2);
        let window = spread_window();

        assert!(gate.decide(120, &window).is_accept());
        assert!(!gate.decide(121, &window).is_accept());
    }

    #[test]
    fn test_rejection_display() {
        let gate = AnomalyGate::default();
        let window = full_window(&[10, 10, 10]);

        let Decision::Reject(rejection) = gate.decide(1000, &window) else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.to_string(), "value 1000 is outside 10 +- 0 (k = 8)");
    }
}
