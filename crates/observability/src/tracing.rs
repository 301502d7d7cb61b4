//! Tracing/logging initialization.
//!
//! `RUST_LOG` wins when set. Otherwise the `BLUEMINE_ENABLE_LOGGING` flag
//! picks between debug-level output and quiet warnings, mirroring how the
//! client config reads the same variable.

use tracing_subscriber::EnvFilter;

const ENABLE_LOGGING_VAR: &str = "BLUEMINE_ENABLE_LOGGING";

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive()));

    // JSON logs + timestamps, configurable via RUST_LOG.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

fn default_directive() -> &'static str {
    let enabled = std::env::var(ENABLE_LOGGING_VAR)
        .map(|v| {
            let v = v.trim().to_ascii_lowercase();
            v == "true" || v == "1"
        })
        .unwrap_or(false);

    if enabled { "debug" } else { "warn" }
}
