//! validator-watch: one-shot health check for a NEAR validator.
//!
//! Loads configuration, runs a single monitoring cycle and exits. Run it from
//! cron or a systemd timer; the previous run's observation is kept in
//! `STATE_FILE`.

use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use validator_watch::WatchConfig;

#[tokio::main]
async fn main() -> ExitCode {
    // config.env is the historical location; a plain .env works too
    dotenvy::from_filename("config.env").ok();
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match WatchConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?config, "configuration loaded");
    tracing::info!("Watching {} via {}", config.pool_id, config.node_rpc);

    let monitor = match validator_watch::monitor_from_config(&config) {
        Ok(monitor) => monitor,
        Err(e) => {
            tracing::error!("Failed to initialize: {e}");
            return ExitCode::FAILURE;
        }
    };

    let report = monitor.run_cycle().await;
    let undelivered = report.dispatched.iter().filter(|d| !d.delivered).count();
    tracing::info!(
        messages = report.dispatched.len(),
        undelivered,
        persisted = report.persisted,
        "cycle finished"
    );

    match report.failure {
        Some(failure) => {
            tracing::error!("Cycle failed while {}: {}", failure.stage, failure.message);
            ExitCode::FAILURE
        }
        None => ExitCode::SUCCESS,
    }
}
