//! Sample ingestion and inspection commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{parse_window_report, ApiClient, PushOutcome};
use crate::output::{
    color_state, describe_rejection, format_fill, format_latency_us, print_info, print_json,
    print_success, print_table, print_warning, OutputFormat,
};

/// Row for the window table
#[derive(Tabled)]
struct WindowRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Value")]
    value: i64,
}

/// Offer one sample to the gate
///
/// Returns whether the sample was accepted so the caller can pick an exit code.
pub async fn push(client: &ApiClient, value: &str, format: OutputFormat) -> Result<bool> {
    let outcome = client.push_sample(value).await?;

    match (&outcome, format) {
        (PushOutcome::Accepted { consumed }, OutputFormat::Json) => {
            print_json(&serde_json::json!({ "accepted": true, "consumed": consumed }))?;
        }
        (PushOutcome::Refused(refusal), OutputFormat::Json) => {
            print_json(&serde_json::json!({ "accepted": false, "refusal": refusal }))?;
        }
        (PushOutcome::Accepted { consumed }, OutputFormat::Table) => {
            print_success(&format!("Accepted {} ({} bytes)", value.trim(), consumed));
        }
        (PushOutcome::Refused(refusal), OutputFormat::Table) => match &refusal.rejection {
            Some(rejection) => {
                print_warning(&format!("Rejected {}", describe_rejection(rejection)));
                println!(
                    "  Window: mean {} std dev {} (k = {})",
                    rejection.mean, rejection.std_dev, rejection.multiplier
                );
            }
            None => print_warning(&format!("Refused: {}", refusal.error)),
        },
    }

    Ok(outcome.is_accepted())
}

/// Show the current window contents, oldest first
pub async fn show(client: &ApiClient, raw: bool, format: OutputFormat) -> Result<()> {
    let report = client.window().await?;

    if raw {
        print!("{}", report);
        return Ok(());
    }

    let values = parse_window_report(&report)?;

    match format {
        OutputFormat::Json => print_json(&values)?,
        OutputFormat::Table => {
            println!("{}", "Sliding Window".bold());
            println!("{}", "=".repeat(30));

            let rows: Vec<WindowRow> = values
                .iter()
                .enumerate()
                .map(|(i, &value)| WindowRow {
                    position: i + 1,
                    value,
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}

/// Show the daemon status
pub async fn status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let status = client.status().await?;

    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Table => {
            println!("{}", "Window Gate Status".bold());
            println!("{}", "=".repeat(50));
            println!("Endpoint:           {}", client.base_url().as_str().cyan());
            println!("State:              {}", color_state(status.state));
            println!(
                "Window:             {}",
                format_fill(status.window_len, status.window_capacity)
            );
            println!("Multiplier (k):     {}", status.std_dev_multiplier);
            println!();

            println!("{}", "Samples".bold());
            println!("{}", "-".repeat(50));
            println!("Accepted:           {}", status.accepted.to_string().green());
            println!("Rejected:           {}", status.rejected.to_string().red());
            println!(
                "Avg latency:        {}",
                format_latency_us(status.average_latency_us)
            );
            println!();

            if status.window_len < status.window_capacity {
                print_info("Gate is warming up, every sample is admitted until the window fills");
            }
        }
    }

    Ok(())
}
