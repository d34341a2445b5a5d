//! Healthcheck server binary

use common::logging::{self, LogFormat};
use healthcheck_server::{Config, HealthServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (needed for logging settings).
    // Only a missing file falls back to defaults; an invalid one is fatal.
    let config = Config::load()?;

    let level = config.logging.level.as_deref().unwrap_or("info");
    let format = match config.logging.format.as_deref() {
        Some(format) => format.parse()?,
        None => LogFormat::default(),
    };
    logging::init_with(level, format)?;

    tracing::info!(checks = config.checks.len(), "Healthcheck server starting");

    HealthServer::from_config(&config).run().await?;

    Ok(())
}
