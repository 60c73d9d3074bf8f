//! Logging setup for the simulation binary.

use anyhow::Result;
use powder_core::LoggingConfig;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,powder_world=debug";

pub fn init_telemetry(config: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.filter.as_deref().unwrap_or(DEFAULT_FILTER).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry.with(fmt::layer().json().with_target(true)).try_init()?;
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()?;
    }

    info!(json = config.json, "Telemetry initialized");
    Ok(())
}
