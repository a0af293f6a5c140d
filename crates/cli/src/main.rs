//! Window Gate CLI
//!
//! A command-line tool for feeding samples to a window gate daemon,
//! inspecting its window and exercising it with a simulated sensor feed.

use anyhow::Result;
use clap::{Parser, Subcommand};
use gate_cli::client::ApiClient;
use gate_cli::commands::{samples, simulate};
use gate_cli::config::Config;
use gate_cli::output::{self, OutputFormat};

/// Window Gate CLI
#[derive(Parser)]
#[command(name = "gatectl")]
#[command(author, version, about = "CLI for the Window Gate daemon", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via GATE_API_URL env var)
    #[arg(long, env = "GATE_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Offer one sample to the gate
    Push {
        /// Sample value, sent verbatim as the request body
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Show the current window contents
    Show {
        /// Print the report exactly as the daemon returns it
        #[arg(long)]
        raw: bool,
    },

    /// Show daemon status
    Status,

    /// Stream a drifting, noisy signal with an injected outlier
    Simulate(simulate::SimulateArgs),

    /// Store the given --api-url and --format as defaults
    Configure,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    let format = config.resolve_format(cli.format);

    // Initialize client
    let client = ApiClient::new(&api_url)?;

    // Execute command
    let ok = match cli.command {
        Commands::Push { value } => samples::push(&client, &value, format).await?,
        Commands::Show { raw } => {
            samples::show(&client, raw, format).await?;
            true
        }
        Commands::Status => {
            samples::status(&client, format).await?;
            true
        }
        Commands::Simulate(args) => simulate::simulate(&client, args, format).await?,
        Commands::Configure => {
            let updated = Config {
                api_url: cli.api_url.or(config.api_url),
                default_format: cli
                    .format
                    .map(|f| format!("{:?}", f).to_lowercase())
                    .or(config.default_format),
            };
            updated.save()?;
            output::print_success(&format!(
                "Saved configuration to {}",
                Config::config_path()?.display()
            ));
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }

    Ok(())
}
