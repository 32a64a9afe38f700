//! Diagnostic tracing for the trainer.
//!
//! Tracing goes to stderr and is controlled by `RUST_LOG`. Results printed by
//! the CLI go to stdout and are unaffected by it.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset, which still shows
/// every failed generation attempt.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=trainer=debug trainer argue --random-motion
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
