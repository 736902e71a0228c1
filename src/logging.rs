//! Diagnostic logging via `tracing`, written to stderr so that stdout stays
//! reserved for command output (tables, JSON).

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable that overrides the configured level.
pub const LOG_ENV: &str = "TUTORCLOCK_LOG";

/// Install the global subscriber. `level` is an EnvFilter directive such as
/// `warn` or `tutorclock=debug`; an invalid directive falls back to `warn`.
/// Safe to call more than once (later calls are ignored).
pub fn init(level: &str) {
    let directive = std::env::var(LOG_ENV).unwrap_or_else(|_| level.to_string());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
