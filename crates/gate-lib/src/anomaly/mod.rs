//! Anomaly gating over the sample window
//!
//! This module provides:
//! - Integer mean and population standard deviation over a window snapshot
//! - The accept/reject gate applied to each candidate sample

mod gate;
mod stats;

pub use gate::{AnomalyGate, Decision, RejectReason, Rejection, DEFAULT_STD_DEV_MULTIPLIER};
pub use stats::{compute_mean, compute_std_dev, int_sqrt, WindowStats};
