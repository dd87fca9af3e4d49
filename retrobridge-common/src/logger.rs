use tracing_subscriber::EnvFilter;

/// Installs the process-wide subscriber. `RUST_LOG` wins when set,
/// `default_filter` applies otherwise. Later calls are no-ops.
pub fn initialize(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let format = tracing_subscriber::fmt::format()
        .without_time()
        .with_target(false)
        .compact();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(format)
        .try_init();
}
