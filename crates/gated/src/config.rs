//! Daemon configuration

use anyhow::{Context, Result};
use gate_lib::GateConfig;
use serde::Deserialize;

/// Daemon configuration, read from `GATE_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Instance name attached to every log line
    #[serde(default = "default_instance")]
    pub instance: String,

    /// Port for the data, health and metrics endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Window capacity
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Payload buffer length
    #[serde(default = "default_max_len")]
    pub max_len: usize,

    /// Standard deviations tolerated around the mean
    #[serde(default = "default_std_dev_multiplier")]
    pub std_dev_multiplier: u32,
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "window-gate".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_window_size() -> usize {
    GateConfig::default().window_size
}

fn default_max_len() -> usize {
    GateConfig::default().max_len
}

fn default_std_dev_multiplier() -> u32 {
    GateConfig::default().std_dev_multiplier
}

impl DaemonConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let source = config::Config::builder()
            .add_source(config::Environment::with_prefix("GATE").try_parsing(true))
            .build()
            .context("Failed to read GATE_* environment")?;

        Self::from_config(source)
    }

    pub fn from_config(source: config::Config) -> Result<Self> {
        let config: Self = source
            .try_deserialize()
            .context("Invalid window gate configuration")?;

        config.gate().validate()?;
        Ok(config)
    }

    /// Tunables handed to the gate service
    pub fn gate(&self) -> GateConfig {
        GateConfig {
            window_size: self.window_size,
            max_len: self.max_len,
            std_dev_multiplier: self.std_dev_multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let source = config::Config::builder().build().unwrap();
        let config = DaemonConfig::from_config(source).unwrap();

        assert_eq!(config.api_port, 8080);
        assert_eq!(config.gate(), GateConfig::default());
    }

    #[test]
    fn test_overrides() {
        let source = config::Config::builder()
            .set_override("window_size", 5)
            .unwrap()
            .set_override("std_dev_multiplier", 3)
            .unwrap()
            .set_override("api_port", 9000)
            .unwrap()
            .build()
            .unwrap();
        let config = DaemonConfig::from_config(source).unwrap();

        assert_eq!(config.api_port, 9000);
        assert_eq!(config.gate().window_size, 5);
        assert_eq!(config.gate().std_dev_multiplier, 3);
        assert_eq!(config.gate().max_len, 16);
    }

    #[test]
    fn test_invalid_tunables_fail_to_load() {
        let source = config::Config::builder()
            .set_override("window_size", 0)
            .unwrap()
            .build()
            .unwrap();

        assert!(DaemonConfig::from_config(source).is_err());
    }
}
