//! Logging configuration for sql-scout.
//!
//! Query results go to stdout; diagnostics go to stderr so the two can be
//! separated in pipelines and test output capture.

use tracing_subscriber::EnvFilter;

/// Initializes stderr logging.
///
/// The filter is taken from `RUST_LOG` when set, defaulting to `info`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
