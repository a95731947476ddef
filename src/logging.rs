use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialise the global `tracing` subscriber
///
/// `RUST_LOG` wins when set; otherwise `level` is used as the filter directive.
/// An unparsable directive falls back to `info`. Output goes to stderr.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    // A second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}
