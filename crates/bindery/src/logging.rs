//! Tracing bootstrap for embedders.
//!
//! The library only emits `tracing` spans/events and `log` records; this
//! helper wires both into one formatted subscriber. Embedders with their
//! own subscriber simply skip it.

use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

/// Installs a formatted global subscriber. `RUST_LOG` wins over the
/// given default filter. Safe to call more than once; later calls are
/// no-ops.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));

    if LogTracer::init().is_err() {
        log::debug!("log-to-tracing bridge already installed");
    }

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("global tracing subscriber already installed");
    }
}
