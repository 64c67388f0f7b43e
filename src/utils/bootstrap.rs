//! Bootstrap utilities for nemesis runners.
//!
//! Shared initialization: tracing and configuration.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LOG_ENV_VAR};

/// Initialize tracing with the NEMESIS_LOG environment variable.
///
/// Defaults to "info" level if NEMESIS_LOG is not set. Safe to call more
/// than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Initialize tracing and load configuration.
///
/// `path` overrides the config file location; otherwise NEMESIS_CONFIG or
/// the default file is used.
pub fn bootstrap(path: Option<&str>) -> Result<Config, ::config::ConfigError> {
    init_tracing();
    let config = Config::load(path)?;
    info!(
        build_timeout = ?config.index.build_timeout(),
        poll_interval = ?config.index.poll_interval(),
        filter_grace = ?config.index.filter_grace(),
        "Nemesis configuration loaded"
    );
    Ok(config)
}
