//! Diagnostic tracing for the runtime and the harness.
//!
//! The library only emits `tracing` events: slot installs and releases at
//! `debug`, allocation and count changes at `trace`, leaks and failed
//! scenarios at `warn`. Nothing is printed unless a subscriber is installed.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a stderr subscriber filtered by `RUST_LOG`, defaulting to `warn`.
///
/// # Example
/// ```bash
/// RUST_LOG=refsteal=debug refsteal run --filter tuple_set_item
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
