//! Observability infrastructure for the window gate
//!
//! Provides:
//! - Prometheus metrics (accepted/rejected/malformed samples, ingest latency, window fill)
//! - Structured JSON logging with tracing

use crate::anomaly::Rejection;
use crate::latency::LatencyReport;
use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for ingest latency (in seconds)
const INGEST_LATENCY_BUCKETS: &[f64] = &[
    0.000_000_5, 0.000_001, 0.000_002_5, 0.000_005, 0.000_01, 0.000_025, 0.000_05, 0.000_1,
    0.000_25, 0.000_5, 0.001,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<GateMetricsInner> = OnceLock::new();

struct GateMetricsInner {
    samples_accepted: IntCounter,
    samples_rejected: IntCounter,
    malformed_payloads: IntCounter,
    ingest_latency_seconds: Histogram,
    window_fill: IntGauge,
}

impl GateMetricsInner {
    fn new() -> Self {
        Self {
            samples_accepted: register_int_counter!(
                "window_gate_samples_accepted_total",
                "Samples admitted into the window"
            )
            .expect("Failed to register samples_accepted"),

            samples_rejected: register_int_counter!(
                "window_gate_samples_rejected_total",
                "Samples turned away by the anomaly gate"
            )
            .expect("Failed to register samples_rejected"),

            malformed_payloads: register_int_counter!(
                "window_gate_malformed_payloads_total",
                "Ingestion payloads that were oversized or not an integer"
            )
            .expect("Failed to register malformed_payloads"),

            ingest_latency_seconds: register_histogram!(
                "window_gate_ingest_latency_seconds",
                "Processing time of accepted ingestions",
                INGEST_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register ingest_latency_seconds"),

            window_fill: register_int_gauge!(
                "window_gate_window_fill",
                "Number of samples currently held in the window"
            )
            .expect("Failed to register window_fill"),
        }
    }
}

/// Handle to the process-wide gate metrics
///
/// Clones share the same underlying Prometheus collectors.
#[derive(Debug, Clone)]
pub struct GateMetrics {
    _private: (),
}

impl Default for GateMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GateMetrics {
    /// Create a metrics handle, registering the collectors on first use
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(GateMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &GateMetricsInner {
        GLOBAL_METRICS.get_or_init(GateMetricsInner::new)
    }

    /// Record an accepted sample and how long it took
    pub fn observe_accepted(&self, duration_secs: f64, window_fill: usize) {
        let inner = self.inner();
        inner.samples_accepted.inc();
        inner.ingest_latency_seconds.observe(duration_secs);
        inner.window_fill.set(window_fill as i64);
    }

    pub fn inc_rejected(&self) {
        self.inner().samples_rejected.inc();
    }

    pub fn inc_malformed(&self) {
        self.inner().malformed_payloads.inc();
    }
}

/// Structured logger for gate events
///
/// This is the logging sink the service reports rejections and the final
/// latency average through.
#[derive(Debug, Clone)]
pub struct GateLogger {
    instance: String,
}

impl Default for GateLogger {
    fn default() -> Self {
        Self::new("window-gate")
    }
}

impl GateLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log a sample admitted into the window
    pub fn log_accepted(&self, value: i64, window_fill: usize, elapsed_ns: u64) {
        debug!(
            event = "sample_accepted",
            instance = %self.instance,
            value = value,
            window_fill = window_fill,
            elapsed_ns = elapsed_ns,
            "Sample accepted"
        );
    }

    /// Log a sample turned away by the gate
    pub fn log_rejection(&self, rejection: &Rejection) {
        info!(
            event = "sample_rejected",
            instance = %self.instance,
            value = rejection.candidate,
            mean = rejection.mean,
            std_dev = rejection.std_dev,
            multiplier = rejection.multiplier,
            reason = rejection.reason.as_str(),
            "New value {} is outside {} +- {}",
            rejection.candidate,
            rejection.mean,
            rejection.std_dev
        );
    }

    /// Log a payload that could not be decoded
    pub fn log_malformed(&self, error: &dyn std::error::Error) {
        debug!(
            event = "payload_malformed",
            instance = %self.instance,
            error = %error,
            "Malformed ingestion payload"
        );
    }

    /// Log the average processing time at teardown
    pub fn log_latency_report(&self, report: &LatencyReport) {
        info!(
            event = "latency_report",
            instance = %self.instance,
            average_us = report.average_us,
            samples = report.samples,
            "Average processing time per update: {} microseconds",
            report.average_us
        );
    }

    pub fn log_endpoint_registered(&self, endpoint: &str) {
        debug!(
            event = "endpoint_registered",
            instance = %self.instance,
            endpoint = %endpoint,
            "Endpoint registered"
        );
    }

    pub fn log_registration_failed(&self, endpoint: &str, error: &dyn std::error::Error) {
        warn!(
            event = "endpoint_registration_failed",
            instance = %self.instance,
            endpoint = %endpoint,
            error = %error,
            "Endpoint registration failed, rolling back"
        );
    }

    /// Log gate startup
    pub fn log_startup(&self, version: &str, window_size: usize, multiplier: u32) {
        info!(
            event = "gate_started",
            instance = %self.instance,
            version = %version,
            window_size = window_size,
            std_dev_multiplier = multiplier,
            "Window gate started"
        );
    }

    /// Log gate shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "gate_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Window gate shutting down"
        );
    }
}
