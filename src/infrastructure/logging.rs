//! Logging configuration
//!
//! Initializes tracing for the application. Diagnostics go to stderr so that
//! stdout carries only the deployment trace or a JSON summary.

use tracing_subscriber::{EnvFilter, fmt};

/// Builds the filter used by [`init_logging`]
///
/// `RUST_LOG` takes precedence over `level`.
pub fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initializes logging with the specified level
///
/// Does nothing if a global subscriber is already installed.
pub fn init_logging(level: &str) {
    let installed = fmt()
        .with_env_filter(log_filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}
