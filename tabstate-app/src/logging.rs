//! Tracing subscriber setup for binaries.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs a compact stderr subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the level is `debug` when
/// `verbose` is set and `info` when not. Calling this twice is harmless.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
