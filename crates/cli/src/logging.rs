// Logging setup. Logs go to stderr so table output on stdout stays clean.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FORMAT_ENV: &str = "CATALOG_SYNC_LOG_FORMAT";
const DEFAULT_DIRECTIVE: &str = "catalog_sync=info";

/// `CATALOG_SYNC_LOG_FORMAT` wins over the configured format
pub fn init(configured_format: &str) -> Result<()> {
    let log_format =
        std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| configured_format.to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_DIRECTIVE))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}
