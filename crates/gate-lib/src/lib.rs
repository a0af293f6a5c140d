//! Streaming anomaly-gated window of integer samples
//!
//! This crate provides the core functionality for:
//! - A fixed-capacity sliding window of samples
//! - Integer mean / population standard deviation over the window
//! - An accept/reject gate for new samples
//! - Processing latency accounting
//! - Endpoint registration with a host, logging and metrics

pub mod anomaly;
pub mod config;
pub mod error;
pub mod host;
pub mod latency;
pub mod observability;
pub mod payload;
pub mod service;
pub mod window;

pub use anomaly::{AnomalyGate, Decision, RejectReason, Rejection, WindowStats};
pub use config::GateConfig;
pub use error::{GateError, HostError, InputError, Result};
pub use host::{Endpoint, EndpointHost, EndpointTable, GateModule};
pub use latency::{LatencyReport, LatencyTracker};
pub use observability::{GateLogger, GateMetrics};
pub use service::{GateService, ServiceState, ServiceStatus};
pub use window::CircularWindow;
