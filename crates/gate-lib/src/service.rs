//! Gate service facade
//!
//! Owns the window, the latency accumulator and the gate, and exposes the
//! three operations the host dispatches to: `ingest`, `inspect` and
//! `finalize`. One mutex guards the whole decide-then-push sequence so two
//! concurrent ingestions never decide against a half-updated window.

use crate::anomaly::{AnomalyGate, Decision};
use crate::config::GateConfig;
use crate::error::{GateError, Result};
use crate::latency::{LatencyReport, LatencyTracker};
use crate::observability::{GateLogger, GateMetrics};
use crate::payload::parse_sample;
use crate::window::CircularWindow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Header line of the inspection report
pub const REPORT_HEADER: &str = "Sliding window values:";

/// Mutable state, only touched with the service lock held
#[derive(Debug)]
struct GateState {
    window: CircularWindow,
    latency: LatencyTracker,
    accepted: u64,
    rejected: u64,
    finalized: bool,
}

/// Streaming anomaly-gated window of integer samples
#[derive(Debug)]
pub struct GateService {
    config: GateConfig,
    gate: AnomalyGate,
    state: Mutex<GateState>,
    logger: GateLogger,
    metrics: GateMetrics,
    started_at: i64,
}

impl GateService {
    /// Create a service with an empty window
    pub fn new(config: GateConfig) -> Result<Self> {
        Self::with_logger(config, GateLogger::default())
    }

    pub fn with_logger(config: GateConfig, logger: GateLogger) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            gate: AnomalyGate::new(config.std_dev_multiplier),
            state: Mutex::new(GateState {
                window: CircularWindow::new(config.window_size),
                latency: LatencyTracker::new(),
                accepted: 0,
                rejected: 0,
                finalized: false,
            }),
            logger,
            metrics: GateMetrics::new(),
            started_at: chrono::Utc::now().timestamp(),
        })
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn logger(&self) -> &GateLogger {
        &self.logger
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        // State is only mutated after every fallible step, so a poisoned
        // guard still holds a consistent window.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decode a payload and offer it to the gate
    ///
    /// Returns the number of payload bytes consumed. Rejected and malformed
    /// samples leave the window and the latency record untouched.
    pub fn ingest(&self, payload: &[u8]) -> Result<usize> {
        let candidate = match parse_sample(payload, self.config.max_payload_len()) {
            Ok(value) => value,
            Err(e) => {
                self.metrics.inc_malformed();
                self.logger.log_malformed(&e);
                return Err(e.into());
            }
        };

        self.offer(candidate)?;
        Ok(payload.len())
    }

    /// Offer an already-decoded sample to the gate
    pub fn offer(&self, candidate: i64) -> Result<()> {
        let mut state = self.lock();
        if state.finalized {
            return Err(GateError::ShutDown);
        }

        let started = Instant::now();

        match self.gate.decide(candidate, &state.window) {
            Decision::Accept => {
                state.window.push(candidate);
                let elapsed = started.elapsed();
                state.latency.record(elapsed);
                state.accepted += 1;

                let fill = state.window.size();
                drop(state);

                self.metrics.observe_accepted(elapsed.as_secs_f64(), fill);
                self.logger.log_accepted(
                    candidate,
                    fill,
                    u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
                );
                Ok(())
            }
            Decision::Reject(rejection) => {
                state.rejected += 1;
                drop(state);

                self.metrics.inc_rejected();
                self.logger.log_rejection(&rejection);
                Err(GateError::Range(rejection))
            }
        }
    }

    /// Current window contents, oldest first
    pub fn window_values(&self) -> Vec<i64> {
        self.lock().window.to_vec()
    }

    /// Write the inspection report into a caller-provided sink
    ///
    /// The window is copied under the lock and formatted after releasing it.
    pub fn write_report<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        let values = self.window_values();

        writeln!(out, "{}", REPORT_HEADER)?;
        for value in values {
            write!(out, "{} ", value)?;
        }
        writeln!(out)
    }

    /// Inspection report listing the window oldest-to-newest
    pub fn inspect(&self) -> String {
        let mut report = String::new();
        // Writing into a String cannot fail
        let _ = self.write_report(&mut report);
        report
    }

    /// Emit the latency report and stop accepting samples
    ///
    /// Waits for any in-flight ingestion. Only the first call reports;
    /// later calls return `None`.
    pub fn finalize(&self) -> Option<LatencyReport> {
        let mut state = self.lock();
        if state.finalized {
            return None;
        }
        state.finalized = true;

        let report = state.latency.report();
        drop(state);

        if let Some(report) = &report {
            self.logger.log_latency_report(report);
        }
        report
    }

    pub fn is_finalized(&self) -> bool {
        self.lock().finalized
    }

    /// Point-in-time summary for health reporting
    pub fn status(&self) -> ServiceStatus {
        let state = self.lock();
        ServiceStatus {
            state: if state.finalized {
                ServiceState::Finalized
            } else if state.window.is_full() {
                ServiceState::Gating
            } else {
                ServiceState::WarmingUp
            },
            window_len: state.window.size(),
            window_capacity: state.window.capacity(),
            std_dev_multiplier: self.config.std_dev_multiplier,
            accepted: state.accepted,
            rejected: state.rejected,
            average_latency_us: state.latency.report().map(|r| r.average_us),
            started_at: self.started_at,
        }
    }
}

/// Lifecycle phase of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// Window not yet full, every sample is admitted
    WarmingUp,
    /// Window full, samples go through the gate
    Gating,
    Finalized,
}

impl ServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::WarmingUp => "warming_up",
            ServiceState::Gating => "gating",
            ServiceState::Finalized => "finalized",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary returned by the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub state: ServiceState,
    pub window_len: usize,
    pub window_capacity: usize,
    pub std_dev_multiplier: u32,
    pub accepted: u64,
    pub rejected: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_latency_us: Option<u64>,
    pub started_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::RejectReason;
    use crate::error::InputError;
    use std::sync::Arc;
    use std::thread;

    fn new_service(window_size: usize) -> GateService {
        GateService::new(GateConfig::default().with_window_size(window_size)).unwrap()
    }

    #[test]
    fn test_end_to_end_capacity_three() {
        let service = new_service(3);

        for _ in 0..3 {
            assert_eq!(service.ingest(b"10").unwrap(), 2);
        }
        assert_eq!(service.window_values(), vec![10, 10, 10]);

        // Equal to the mean with zero deviation: inside the band
        assert!(service.ingest(b"10").is_ok());
        assert_eq!(service.window_values(), vec![10, 10, 10]);

        let err = service.ingest(b"1000").unwrap_err();
        match err {
            GateError::Range(rejection) => {
                assert_eq!(rejection.candidate, 1000);
                assert_eq!(rejection.mean, 10);
                assert_eq!(rejection.std_dev, 0);
                assert_eq!(rejection.reason, RejectReason::AboveUpperBound);
            }
            other => panic!("expected range error, got {other:?}"),
        }
        assert_eq!(service.window_values(), vec![10, 10, 10]);
    }

    #[test]
    fn test_warm_up_accepts_any_magnitude() {
        let service = new_service(20);
        // Longest payloads that fit in MAX_LEN - 1 bytes
        for payload in [&b"1"[..], b"-99999999999999", b"999999999999999", b"0"] {
            assert!(service.ingest(payload).is_ok());
        }
        service.offer(i64::MIN).unwrap();
        service.offer(i64::MAX).unwrap();

        assert_eq!(
            service.window_values(),
            vec![1, -99_999_999_999_999, 999_999_999_999_999, 0, i64::MIN, i64::MAX]
        );
        assert_eq!(service.status().state, ServiceState::WarmingUp);
    }

    #[test]
    fn test_payload_errors() {
        let service = new_service(20);

        let err = service.ingest(b"12345678901234567").unwrap_err();
        assert!(matches!(err, GateError::Input(InputError::TooLong { len: 17, max: 15 })));
        assert!(err.is_invalid_argument());

        let err = service.ingest(b"abc").unwrap_err();
        assert!(matches!(err, GateError::Input(InputError::NotAnInteger(_))));

        assert_eq!(service.ingest(b"-5").unwrap(), 2);
        assert_eq!(service.window_values(), vec![-5]);
    }

    #[test]
    fn test_fifo_after_capacity() {
        let service = new_service(4);
        for v in 1..=4 {
            service.offer(v * 100).unwrap();
        }
        // mean 250, stddev 111; 500 and 600 stay inside 8 sigma
        service.offer(500).unwrap();
        service.offer(600).unwrap();

        assert_eq!(service.window_values(), vec![300, 400, 500, 600]);
    }

    #[test]
    fn test_rejection_leaves_window_and_latency_untouched() {
        let service = new_service(3);
        for v in [10, 20, 30] {
            service.offer(v).unwrap();
        }
        let before = service.window_values();
        let accepted_before = service.status().accepted;

        assert!(service.offer(10_000).is_err());
        assert!(service.offer(-10_000).is_err());

        assert_eq!(service.window_values(), before);
        let status = service.status();
        assert_eq!(status.accepted, accepted_before);
        assert_eq!(status.rejected, 2);
        assert!(!service.inspect().contains("10000"));

        // The next accepted sample still evicts the same oldest value
        service.offer(20).unwrap();
        assert_eq!(service.window_values(), vec![20, 30, 20]);
    }

    #[test]
    fn test_inspect_format() {
        let service = new_service(3);
        assert_eq!(service.inspect(), "Sliding window values:\n\n");

        for v in [10, -2, 7, 8] {
            service.offer(v).unwrap();
        }
        assert_eq!(service.inspect(), "Sliding window values:\n-2 7 8 \n");
    }

    #[test]
    fn test_write_report_into_caller_buffer() {
        let service = new_service(2);
        service.offer(1).unwrap();

        let mut out = String::from(">> ");
        service.write_report(&mut out).unwrap();
        assert_eq!(out, ">> Sliding window values:\n1 \n");
    }

    #[test]
    fn test_finalize_is_idempotent_and_stops_ingestion() {
        let service = new_service(3);
        assert!(service.finalize().is_none());
        assert!(service.finalize().is_none());
        assert!(service.is_finalized());
        assert!(matches!(service.offer(1), Err(GateError::ShutDown)));

        let service = new_service(3);
        service.offer(1).unwrap();
        let report = service.finalize().unwrap();
        assert_eq!(report.samples, 1);
        assert!(service.finalize().is_none());
        assert!(matches!(service.ingest(b"2"), Err(GateError::ShutDown)));
        assert_eq!(service.status().state, ServiceState::Finalized);
    }

    #[test]
    fn test_latency_recorded_for_accepted_only() {
        let service = new_service(3);
        for _ in 0..3 {
            service.offer(5).unwrap();
        }
        let _ = service.offer(500);
        let _ = service.ingest(b"nope");

        let report = service.finalize().unwrap();
        assert_eq!(report.samples, 3);
    }

    #[test]
    fn test_status_phases() {
        let service = new_service(2);
        assert_eq!(service.status().state, ServiceState::WarmingUp);
        service.offer(1).unwrap();
        service.offer(1).unwrap();

        let status = service.status();
        assert_eq!(status.state, ServiceState::Gating);
        assert_eq!(status.window_len, 2);
        assert_eq!(status.window_capacity, 2);
        assert!(status.average_latency_us.is_some());
    }

    #[test]
    fn test_state_names_match_wire_format() {
        for state in [
            ServiceState::WarmingUp,
            ServiceState::Gating,
            ServiceState::Finalized,
        ] {
            let wire = serde_json::to_value(state).unwrap();
            assert_eq!(wire, state.as_str());
            assert_eq!(state.to_string(), state.as_str());
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = GateService::new(GateConfig::default().with_window_size(0)).unwrap_err();
        assert!(matches!(err, GateError::Config(_)));
    }

    #[test]
    fn test_concurrent_ingestion_keeps_window_consistent() {
        let service = Arc::new(new_service(20));

        thread::scope(|scope| {
            for t in 0..8 {
                let service = Arc::clone(&service);
                scope.spawn(move || {
                    for i in 0..250 {
                        let _ = service.offer(1000 + (t * 250 + i) % 7);
                        let report = service.inspect();
                        assert!(report.starts_with(REPORT_HEADER));
                    }
                });
            }
        });

        let status = service.status();
        assert_eq!(status.window_len, 20);
        assert_eq!(status.accepted + status.rejected, 2000);
        assert!(service
            .window_values()
            .iter()
            .all(|v| (1000..1007).contains(v)));
    }
}
