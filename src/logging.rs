use tracing_subscriber::EnvFilter;

/// Initialise logging to stderr
///
/// Without `debug` the level is fixed at `info`, whatever `RUST_LOG` says.
/// With `debug` the level is `debug` unless `RUST_LOG` overrides it.
pub fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    // stdout carries command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
