//! Tracing setup

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(service_name: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer().with_target(true).with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to init tracing: {}", e))?;

    tracing::info!("Tracing initialized for service: {}", service_name);
    Ok(())
}
