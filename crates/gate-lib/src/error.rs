//! Error types for the window gate

use crate::anomaly::Rejection;
use thiserror::Error;

/// Result alias used across the gate library
pub type Result<T> = std::result::Result<T, GateError>;

/// Errors surfaced by the gate service and its lifecycle
#[derive(Debug, Error)]
pub enum GateError {
    /// Oversized or unparseable ingestion payload
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    /// Candidate rejected by the anomaly gate
    #[error("Sample rejected: {0}")]
    Range(Rejection),

    /// Endpoint registration failed during startup
    #[error("Initialization failed: {0}")]
    Init(#[from] HostError),

    /// Ingestion attempted after the service was finalized
    #[error("Service has been finalized")]
    ShutDown,

    /// Invalid tunables
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GateError {
    /// Errors the host reports as an invalid argument to the caller
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, GateError::Input(_) | GateError::Range(_))
    }

    /// Short machine-readable kind, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            GateError::Input(_) => "input",
            GateError::Range(_) => "range",
            GateError::Init(_) => "init",
            GateError::ShutDown => "shut_down",
            GateError::Config(_) => "config",
        }
    }
}

/// Problems with a raw ingestion payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    TooLong { len: usize, max: usize },

    #[error("payload is empty")]
    Empty,

    #[error("payload {0:?} is not a base-10 integer")]
    NotAnInteger(String),
}

/// Failures reported by the hosting environment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("endpoint {0} is already registered")]
    AlreadyRegistered(&'static str),

    #[error("host refused endpoint {endpoint}: {message}")]
    Refused {
        endpoint: &'static str,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let input = GateError::from(InputError::Empty);
        assert!(input.is_invalid_argument());
        assert_eq!(input.kind(), "input");

        let init = GateError::from(HostError::AlreadyRegistered("data_in"));
        assert!(!init.is_invalid_argument());
        assert_eq!(init.kind(), "init");

        assert!(!GateError::ShutDown.is_invalid_argument());
    }

    #[test]
    fn test_error_messages() {
        let err = GateError::from(InputError::TooLong { len: 17, max: 15 });
        assert_eq!(
            err.to_string(),
            "Invalid input: payload of 17 bytes exceeds the 15 byte limit"
        );

        let err = HostError::Refused {
            endpoint: "data_out",
            message: "out of memory".to_string(),
        };
        assert_eq!(err.to_string(), "host refused endpoint data_out: out of memory");
    }
}
