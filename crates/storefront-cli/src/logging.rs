//! Log subscriber setup

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies. Logs go
/// to stderr so JSON results on stdout stay machine-readable.
pub fn init(default_filter: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    // a second init (tests) is not an error worth surfacing
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}
