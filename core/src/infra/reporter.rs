//! `TracingReporter` forwards `ProgressReporter` messages to `tracing`.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::application::ports::ProgressReporter;

/// Reporter that logs every message through `tracing`.
///
/// - `step()` → `info!`
/// - `detail()` → `debug!`
/// - `warn()` → `warn!`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn step(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn detail(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow!("cannot install tracing subscriber: {e}"))
}
