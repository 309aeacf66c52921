//! Logging setup for the binary
//!
//! Logs go to stderr so the report on stdout stays machine-readable.
//! `RUST_LOG` wins over the level given on the command line.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber
///
/// Call once at startup, before any events are emitted. A second call is a
/// no-op.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
