//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `default_level` comes from the config; the `STASH_LOG` environment
/// variable overrides it with a full filter directive when set.
pub fn init(default_level: &str) {
    let filter = EnvFilter::builder()
        .with_env_var("STASH_LOG")
        .try_from_env()
        .unwrap_or_else(|_| {
            EnvFilter::try_new(default_level).unwrap_or_else(|_| EnvFilter::new("info"))
        });

    // `try_init` so tests that initialize twice don't panic.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
