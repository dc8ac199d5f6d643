//! Structured logging initialization via `tracing`.

/// Initialize the tracing subscriber.
///
/// Respects the `RUST_LOG` environment variable for filtering; `json`
/// selects machine-readable output for log aggregation.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::EnvFilter;
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
