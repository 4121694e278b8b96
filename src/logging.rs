//! Diagnostic logging setup

use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or the
/// crate's info events with `verbose`. Calling it twice is harmless.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,gitup=info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
