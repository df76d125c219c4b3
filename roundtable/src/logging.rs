//! Development-time tracing for debugging roundtable.
//!
//! Tracing is dev diagnostics via `RUST_LOG`, written to stderr and never
//! persisted. Turn logs under `.roundtable/turns/` (see `io::turn_log`) are
//! product artifacts, always written and unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=roundtable=debug roundtable run
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
