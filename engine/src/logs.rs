//! Logging setup and console helpers.
//!
//! Library code emits `tracing` events directly. The `log_*` helpers are
//! used for the human-readable run banner and summary lines so they share
//! one prefix convention.

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// Uses the `RUST_LOG` env var if set, otherwise falls back to `level`.
/// A second call leaves the first subscriber in place.
pub fn init(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        tracing::debug!("Logging already initialised");
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    info!("{}", msg.into());
}

pub fn log_success(msg: impl Into<String>) {
    info!("✓ {}", msg.into());
}

pub fn log_warning(msg: impl Into<String>) {
    warn!("⚠️ {}", msg.into());
}

pub fn log_error(msg: impl Into<String>) {
    error!("❌ {}", msg.into());
}
