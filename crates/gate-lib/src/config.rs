//! Gate tunables

use crate::anomaly::DEFAULT_STD_DEV_MULTIPLIER;
use crate::error::{GateError, Result};
use crate::window::DEFAULT_WINDOW_SIZE;
use serde::{Deserialize, Serialize};

/// Default payload buffer length; payloads may use `MAX_LEN - 1` bytes
pub const DEFAULT_MAX_LEN: usize = 16;

/// Start-time configuration for the gate service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Window capacity
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Payload buffer length, one byte is reserved for the terminator
    #[serde(default = "default_max_len")]
    pub max_len: usize,

    /// Standard deviations tolerated on either side of the mean
    #[serde(default = "default_std_dev_multiplier")]
    pub std_dev_multiplier: u32,
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_max_len() -> usize {
    DEFAULT_MAX_LEN
}

fn default_std_dev_multiplier() -> u32 {
    DEFAULT_STD_DEV_MULTIPLIER
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            max_len: default_max_len(),
            std_dev_multiplier: default_std_dev_multiplier(),
        }
    }
}

impl GateConfig {
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn with_std_dev_multiplier(mut self, multiplier: u32) -> Self {
        self.std_dev_multiplier = multiplier;
        self
    }

    /// Largest payload accepted by the ingestion endpoint
    pub fn max_payload_len(&self) -> usize {
        self.max_len.saturating_sub(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(GateError::Config("window_size must be at least 1".into()));
        }
        if self.max_len < 2 {
            return Err(GateError::Config(
                "max_len must leave room for at least one digit".into(),
            ));
        }
        Ok(())
    }
}
