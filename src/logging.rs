use tracing_subscriber::EnvFilter;

/// Initialise logging to stderr. The level is `info` unless `debug` is set,
/// in which case it is `debug` and may be overridden through `RUST_LOG`.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
