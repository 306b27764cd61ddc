//! Tracing Setup
//!
//! Installs the global `tracing` subscriber: an fmt layer filtered by
//! `RUST_LOG`, with `item_service=info` added as a baseline directive.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Baseline filter directives added on top of `RUST_LOG`.
const DEFAULT_DIRECTIVES: [&str; 2] = ["item_service=info", "hyper=warn"];

/// Initialize the global subscriber.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init() {
    let env_filter = DEFAULT_DIRECTIVES
        .iter()
        .filter_map(|directive| directive.parse().ok())
        .fold(EnvFilter::from_default_env(), EnvFilter::add_directive);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
