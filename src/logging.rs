//! Tracing initialization.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `ENET_LOG=element_networks=debug`.
pub const LOG_ENV: &str = "ENET_LOG";

/// Install the global subscriber, logging to stderr so stdout stays clean for reports.
///
/// Falls back to `warn` when `ENET_LOG` is unset or invalid. Calling it twice is
/// harmless; the second call leaves the first subscriber in place.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
