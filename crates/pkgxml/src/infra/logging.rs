//! Tracing subscriber setup.

use tracing::Level;

/// Install the global fmt subscriber writing to stderr.
///
/// Debug output (for example manifests skipped for having the wrong shape) only shows up when
/// `debug` is set. Calling this twice keeps the first subscriber.
pub fn init(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
