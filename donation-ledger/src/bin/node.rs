//! Donation ledger node binary

use anyhow::Context;
use donation_ledger::clock::WallClockHeight;
use donation_ledger::integration::{InMemoryBank, InMemoryRewardToken};
use donation_ledger::{Config, DonationLedger};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    tracing::info!("Starting donation ledger node");

    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => Config::from_env().context("Failed to load configuration from environment")?,
    };

    let heights = WallClockHeight::from_config(&config.clock)?;

    // Collaborators live in-process until a chain adapter is wired in
    let bank = Arc::new(InMemoryBank::new());
    let token = Arc::new(InMemoryRewardToken::new());

    // Open ledger
    let ledger = DonationLedger::open(config, bank, token, heights)
        .await
        .context("Failed to open donation ledger")?;
    tracing::info!("Ledger opened successfully");

    let stats = ledger.get_statistics().await?;
    tracing::info!(statistics = %serde_json::to_string(&stats)?, "Ledger statistics");

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down donation ledger node");
    tracing::debug!(metrics = %ledger.metrics().encode_text(), "Final metrics");
    ledger.shutdown().await?;

    Ok(())
}
