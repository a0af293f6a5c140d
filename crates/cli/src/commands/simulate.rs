//! Simulated sensor feed command

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::client::ApiClient;
use crate::output::{print_error, print_info, print_json, print_success, OutputFormat};
use crate::simulate::{run_simulation, SimulationConfig, SimulationOutcome};

/// Options for the `simulate` command
#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    /// Samples per second
    #[arg(long, default_value_t = 20)]
    pub fps: u32,

    /// Length of the run in seconds
    #[arg(long, default_value_t = 20)]
    pub seconds: u32,

    /// Starting baseline
    #[arg(long, default_value_t = 2000.0, allow_hyphen_values = true)]
    pub start: f64,

    /// Baseline increase per sample
    #[arg(long, default_value_t = 4.0, allow_hyphen_values = true)]
    pub drift: f64,

    /// Standard deviation of the noise
    #[arg(long, default_value_t = 20.0, allow_hyphen_values = true)]
    pub std_dev: f64,

    /// Second at which to inject the outlier
    #[arg(long, default_value_t = 15)]
    pub attack_at: u32,

    /// Value of the injected outlier
    #[arg(long, default_value_t = 20_000, allow_hyphen_values = true)]
    pub attack_value: i64,

    /// Do not inject an outlier
    #[arg(long)]
    pub no_attack: bool,

    /// RNG seed for a reproducible feed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Send samples as fast as possible instead of at --fps
    #[arg(long)]
    pub fast: bool,
}

impl From<SimulateArgs> for SimulationConfig {
    fn from(args: SimulateArgs) -> Self {
        SimulationConfig {
            fps: args.fps.max(1),
            seconds: args.seconds,
            start: args.start,
            drift: args.drift,
            std_dev: args.std_dev,
            attack_at: (!args.no_attack).then_some(args.attack_at),
            attack_value: args.attack_value,
            seed: args.seed,
            realtime: !args.fast,
        }
    }
}

/// Run the simulation and print its outcome
///
/// Returns whether the run ended the way a working gate should.
pub async fn simulate(client: &ApiClient, args: SimulateArgs, format: OutputFormat) -> Result<bool> {
    let config = SimulationConfig::from(args);
    let seconds = config.seconds;
    let verbose = format == OutputFormat::Table;

    if verbose {
        print_info(&format!(
            "Streaming {} samples/s for {}s to {}",
            config.fps,
            seconds,
            client.base_url()
        ));
    }

    let report = run_simulation(client, config, |second| {
        if verbose {
            println!("{}", format!("Time: {}s", second).dimmed());
        }
    })
    .await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            let message = report.outcome.message();
            match &report.outcome {
                SimulationOutcome::DetectedAttack { .. } | SimulationOutcome::Completed => {
                    print_success(message)
                }
                SimulationOutcome::FalseAttack { value, .. } => {
                    print_error(&format!("{} on value {}", message, value))
                }
                SimulationOutcome::MissedAttack { .. } => print_error(message),
            }
            println!(
                "Samples sent: {}, accepted: {}",
                report.samples_sent, report.samples_accepted
            );
        }
    }

    Ok(report.outcome.is_success())
}
