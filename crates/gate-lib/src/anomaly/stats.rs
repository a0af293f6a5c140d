//! Integer window statistics
//!
//! Mean and population standard deviation over the current window contents.
//! Everything stays in integer arithmetic: the mean truncates toward zero and
//! the standard deviation is the floor of the integer square root of the
//! truncated variance, so results are reproducible on every platform.

use crate::window::CircularWindow;
use serde::{Deserialize, Serialize};

/// Statistics derived from one window snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Truncated mean of the window
    pub mean: i64,
    /// Floor of the population standard deviation
    pub std_dev: i64,
    /// Number of samples the statistics were computed over
    pub count: usize,
}

impl WindowStats {
    /// Compute mean and standard deviation, `None` for an empty window
    pub fn compute(window: &CircularWindow) -> Option<Self> {
        let mean = compute_mean(window)?;
        let std_dev = compute_std_dev(window, mean)?;

        Some(Self {
            mean,
            std_dev,
            count: window.size(),
        })
    }
}

/// Sum of the window divided by its size, truncating toward zero
pub fn compute_mean(window: &CircularWindow) -> Option<i64> {
    if window.is_empty() {
        return None;
    }

    let sum: i128 = window.snapshot().map(i128::from).sum();
    let mean = sum / window.size() as i128;

    // The mean of i64 values always lies within i64 range
    Some(mean as i64)
}

/// Population standard deviation around `mean`
///
/// Squared deviations are summed, divided by the window size (truncating),
/// and the floor of the square root is taken.
pub fn compute_std_dev(window: &CircularWindow, mean: i64) -> Option<i64> {
    if window.is_empty() {
        return None;
    }

    let mean = i128::from(mean);
    let sum_sq_diff = window.snapshot().fold(0u128, |acc, value| {
        let diff = (i128::from(value) - mean).unsigned_abs();
        acc.saturating_add(diff.saturating_mul(diff))
    });

    let variance = sum_sq_diff / window.size() as u128;
    Some(i64::try_from(int_sqrt(variance)).unwrap_or(i64::MAX))
}

/// Floor of the square root, computed bit by bit
pub fn int_sqrt(mut x: u128) -> u128 {
    if x <= 1 {
        return x;
    }

    let mut m: u128 = 1 << ((127 - x.leading_zeros()) & !1);
    let mut y: u128 = 0;

    while m != 0 {
        let b = y + m;
        y >>= 1;
        if x >= b {
            x -= b;
            y += m;
        }
        m >>= 2;
    }

    y
}
