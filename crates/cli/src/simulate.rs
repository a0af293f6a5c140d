//! Synthetic sample streams
//!
//! Generates a noisy, linearly drifting signal with one injected outlier and
//! plays it against the gate, the way a sensor feed under attack would look.

use crate::client::{ApiClient, PushOutcome};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use serde::Serialize;
use std::time::Duration;

/// Parameters of a simulated feed
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Samples per second
    pub fps: u32,
    /// Length of the run in seconds
    pub seconds: u32,
    /// Baseline before the first tick
    pub start: f64,
    /// Baseline increase per tick
    pub drift: f64,
    /// Gaussian noise around the baseline
    pub std_dev: f64,
    /// Second at which the outlier is injected, if any
    pub attack_at: Option<u32>,
    /// Value sent instead of the regular sample at the attack tick
    pub attack_value: i64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
    /// Pace samples at `fps` instead of sending as fast as possible
    pub realtime: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fps: 20,
            seconds: 20,
            start: 2000.0,
            drift: 4.0,
            std_dev: 20.0,
            attack_at: Some(15),
            attack_value: 20_000,
            seed: None,
            realtime: true,
        }
    }
}

impl SimulationConfig {
    pub fn total_ticks(&self) -> u64 {
        u64::from(self.fps) * u64::from(self.seconds)
    }

    pub fn attack_tick(&self) -> Option<u64> {
        self.attack_at.map(|s| u64::from(s) * u64::from(self.fps))
    }
}

/// One generated sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tick {
    pub index: u64,
    pub value: i64,
    pub is_attack: bool,
}

/// Iterator over the simulated feed
pub struct SampleStream {
    config: SimulationConfig,
    rng: StdRng,
    noise: Normal<f64>,
    baseline: f64,
    index: u64,
}

impl SampleStream {
    /// Fails when `std_dev` is negative or not finite
    pub fn new(config: SimulationConfig) -> Result<Self> {
        if !config.std_dev.is_finite() {
            anyhow::bail!("Invalid noise standard deviation {}", config.std_dev);
        }
        let noise = Normal::new(0.0, config.std_dev)
            .with_context(|| format!("Invalid noise standard deviation {}", config.std_dev))?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            baseline: config.start,
            config,
            rng,
            noise,
            index: 0,
        })
    }
}

impl Iterator for SampleStream {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        if self.index >= self.config.total_ticks() {
            return None;
        }

        self.baseline += self.config.drift;
        let noise = self.rng.sample(self.noise);

        let is_attack = self.config.attack_tick() == Some(self.index);
        let value = if is_attack {
            self.config.attack_value
        } else {
            // Truncate toward zero, like an integer sensor reading
            (self.baseline + noise) as i64
        };

        let tick = Tick {
            index: self.index,
            value,
            is_attack,
        };
        self.index += 1;
        Some(tick)
    }
}

/// How a simulated run ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SimulationOutcome {
    /// The injected outlier was rejected
    DetectedAttack { tick: u64 },
    /// A regular sample was rejected
    FalseAttack { tick: u64, value: i64 },
    /// The injected outlier was admitted into the window
    MissedAttack { tick: u64 },
    /// Every sample was accepted and no outlier was injected
    Completed,
}

impl SimulationOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            SimulationOutcome::DetectedAttack { .. } => "Detected attack",
            SimulationOutcome::FalseAttack { .. } => "Detected false attack",
            SimulationOutcome::MissedAttack { .. } => "Did not detect attack",
            SimulationOutcome::Completed => "Run completed without rejections",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SimulationOutcome::DetectedAttack { .. } | SimulationOutcome::Completed
        )
    }
}

/// Summary of a simulated run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    #[serde(flatten)]
    pub outcome: SimulationOutcome,
    pub samples_sent: u64,
    pub samples_accepted: u64,
}

/// Play the feed against the gate until the first refusal or the attack tick
///
/// `on_second` is called at the start of every simulated second.
pub async fn run_simulation<F>(
    client: &ApiClient,
    config: SimulationConfig,
    mut on_second: F,
) -> Result<SimulationReport>
where
    F: FnMut(u64),
{
    let fps = u64::from(config.fps.max(1));
    let mut pacer = if config.realtime {
        let mut interval = tokio::time::interval(Duration::from_secs(1) / config.fps.max(1));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        Some(interval)
    } else {
        None
    };

    let mut sent = 0u64;
    let mut accepted = 0u64;

    for tick in SampleStream::new(config)? {
        if let Some(pacer) = pacer.as_mut() {
            pacer.tick().await;
        }
        if tick.index % fps == 0 {
            on_second(tick.index / fps);
        }

        let outcome = client.push_sample(&tick.value.to_string()).await?;
        sent += 1;

        let finished = match outcome {
            PushOutcome::Accepted { .. } => {
                accepted += 1;
                tick.is_attack
                    .then_some(SimulationOutcome::MissedAttack { tick: tick.index })
            }
            PushOutcome::Refused(refusal) if !refusal.is_rejection() => {
                anyhow::bail!("Gate refused sample {}: {}", tick.value, refusal.error);
            }
            PushOutcome::Refused(_) if tick.is_attack => {
                Some(SimulationOutcome::DetectedAttack { tick: tick.index })
            }
            PushOutcome::Refused(_) => Some(SimulationOutcome::FalseAttack {
                tick: tick.index,
                value: tick.value,
            }),
        };

        if let Some(outcome) = finished {
            return Ok(SimulationReport {
                outcome,
                samples_sent: sent,
                samples_accepted: accepted,
            });
        }
    }

    Ok(SimulationReport {
        outcome: SimulationOutcome::Completed,
        samples_sent: sent,
        samples_accepted: accepted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> SimulationConfig {
        SimulationConfig {
            fps: 4,
            seconds: 3,
            start: 100.0,
            drift: 2.0,
            std_dev: 0.0,
            attack_at: Some(2),
            attack_value: 9_999,
            seed: Some(7),
            realtime: false,
        }
    }

    #[test]
    fn test_noise_free_stream_follows_baseline() {
        let ticks: Vec<Tick> = SampleStream::new(quiet_config()).unwrap().collect();

        assert_eq!(ticks.len(), 12);
        assert_eq!(ticks[0].value, 102);
        assert_eq!(ticks[1].value, 104);
        assert!(ticks[8].is_attack);
        assert_eq!(ticks[8].value, 9_999);
        assert_eq!(ticks[9].value, 120);
        assert_eq!(ticks.iter().filter(|t| t.is_attack).count(), 1);
    }

    #[test]
    fn test_seeded_streams_are_reproducible() {
        let config = SimulationConfig {
            std_dev: 20.0,
            realtime: false,
            seed: Some(42),
            ..SimulationConfig::default()
        };

        let a: Vec<i64> = SampleStream::new(config.clone())
            .unwrap()
            .map(|t| t.value)
            .collect();
        let b: Vec<i64> = SampleStream::new(config).unwrap().map(|t| t.value).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 400);
        assert_eq!(a[300], 20_000);
    }

    #[test]
    fn test_noise_stays_plausible() {
        let config = SimulationConfig {
            attack_at: None,
            seed: Some(1),
            realtime: false,
            ..SimulationConfig::default()
        };

        // 8 sigma around the baseline is never reached by honest samples
        for tick in SampleStream::new(config).unwrap() {
            let baseline = 2000 + 4 * (tick.index as i64 + 1);
            assert!((tick.value - baseline).abs() < 160, "tick {:?}", tick);
        }
    }

    #[test]
    fn test_invalid_noise_is_refused() {
        for std_dev in [-5.0, f64::NAN, f64::INFINITY] {
            let config = SimulationConfig {
                std_dev,
                ..quiet_config()
            };
            assert!(SampleStream::new(config).is_err(), "std_dev {}", std_dev);
        }
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(
            SimulationOutcome::DetectedAttack { tick: 1 }.message(),
            "Detected attack"
        );
        assert!(!SimulationOutcome::MissedAttack { tick: 1 }.is_success());
        assert!(!SimulationOutcome::FalseAttack { tick: 1, value: 3 }.is_success());
    }
}
