//! tracing-subscriber setup

use crate::config::LogFormat;
use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "ingestq=info,tower_http=info";

/// `RUST_LOG` overrides the default filter
pub fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        // Production: JSON structured logging
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        // Development: Pretty formatting with colors
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    }
    .context("Failed to install tracing subscriber")
}
