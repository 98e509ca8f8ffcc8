use tracing_subscriber::EnvFilter;

/// Filter directives for all binaries, e.g. `RECENT_LOG=debug`.
pub const LOG_ENV: &str = "RECENT_LOG";

/// Install the stderr subscriber. Quiet (`warn`) unless `RECENT_LOG` says otherwise.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
