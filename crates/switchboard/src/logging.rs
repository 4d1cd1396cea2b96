//! Diagnostic logging setup.
//!
//! The library crates only emit `tracing` events. Applications opt into
//! seeing them by calling [`init`] once at startup; the filter comes from
//! the `SWITCHBOARD_LOG` environment variable (`EnvFilter` syntax, e.g.
//! `switchboard_dispatch=debug`) and defaults to `warn`. Output goes to
//! stderr so it never mixes with command output.

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "SWITCHBOARD_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber. Does nothing if one is already set.
pub fn init() {
    if let Err(e) = try_init() {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}

/// Installs the global subscriber, failing if one is already set.
pub fn try_init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    fmt()
        .with_env_filter(filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
