//! Opt-in log output for hosts that don't install their own subscriber.

use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber filtered by `filter`
/// (`EnvFilter` directive syntax, e.g. `"mealdb_kit=debug,warn"`).
///
/// An unparsable directive falls back to `info`. Returns `false` if a
/// global subscriber was already installed.
pub fn init_logging(filter: &str) -> bool {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
