//! Window gate - anomaly-gated sliding window daemon
//!
//! Accepts integer samples on `POST /data_in`, rejects statistical outliers,
//! and lists the window on `GET /data_out`. The average processing latency is
//! logged on shutdown.

use anyhow::Result;
use gate_lib::{EndpointTable, GateLogger, GateModule};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use window_gate::{api, config};

const GATE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting window-gate");

    let config = config::DaemonConfig::load()?;
    let gate_config = config.gate();
    info!(instance = %config.instance, "Gate configured");

    let logger = GateLogger::new(&config.instance);
    logger.log_startup(
        GATE_VERSION,
        gate_config.window_size,
        gate_config.std_dev_multiplier,
    );

    // Register both endpoints or fail startup as a unit
    let mut endpoints = EndpointTable::new();
    let module = GateModule::init(&mut endpoints, gate_config, logger.clone())?;

    let app_state = Arc::new(api::AppState::new(Arc::clone(module.service())));
    let router = api::create_router(app_state, &endpoints);

    api::serve(
        config.api_port,
        router,
        api::shutdown_on(tokio::signal::ctrl_c()),
    )
    .await?;

    logger.log_shutdown("SIGINT received");
    if module.teardown(&mut endpoints).is_none() {
        info!("No samples accepted, no latency report");
    }

    Ok(())
}
