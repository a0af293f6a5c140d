//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use gate_lib::{RejectReason, Rejection, ServiceState};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse a format name stored in the config file
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Print a table from a list of items
pub fn print_table<T: Tabled>(items: &[T]) {
    if items.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color a service state
pub fn color_state(state: ServiceState) -> String {
    let name = state.as_str();
    match state {
        ServiceState::WarmingUp => name.yellow().to_string(),
        ServiceState::Gating => name.green().to_string(),
        ServiceState::Finalized => name.red().to_string(),
    }
}

/// One-line summary of why the gate turned a sample away
pub fn describe_rejection(rejection: &Rejection) -> String {
    let side = match rejection.reason {
        RejectReason::BelowLowerBound => "below",
        RejectReason::AboveUpperBound => "above",
    };
    format!(
        "{} is {} {} the band [{}, {}]",
        rejection.candidate,
        rejection.excess(),
        side,
        rejection.lower_bound,
        rejection.upper_bound
    )
}

/// Format a microsecond latency
pub fn format_latency_us(micros: Option<u64>) -> String {
    match micros {
        Some(us) if us >= 1000 => format!("{:.2}ms", us as f64 / 1000.0),
        Some(us) => format!("{}µs", us),
        None => "-".to_string(),
    }
}

/// Format a window fill level as `len/capacity`
pub fn format_fill(len: usize, capacity: usize) -> String {
    let fill = format!("{}/{}", len, capacity);
    if len >= capacity {
        fill.green().to_string()
    } else {
        fill.yellow().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_latency() {
        assert_eq!(format_latency_us(None), "-");
        assert_eq!(format_latency_us(Some(12)), "12µs");
        assert_eq!(format_latency_us(Some(1500)), "1.50ms");
    }

    #[test]
    fn test_describe_rejection() {
        let rejection = Rejection {
            reason: RejectReason::AboveUpperBound,
            candidate: 181,
            mean: 100,
            std_dev: 10,
            multiplier: 8,
            lower_bound: 20,
            upper_bound: 180,
        };
        assert_eq!(
            describe_rejection(&rejection),
            "181 is 1 above the band [20, 180]"
        );

        let below = Rejection {
            reason: RejectReason::BelowLowerBound,
            candidate: 5,
            ..rejection
        };
        assert_eq!(describe_rejection(&below), "5 is 15 below the band [20, 180]");
    }

    #[test]
    fn test_format_name_lookup() {
        assert_eq!(OutputFormat::from_name("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_name("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_name("yaml"), None);
    }
}
