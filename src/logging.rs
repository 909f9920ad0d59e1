//! Logging setup
//!
//! Stderr tracing subscriber for the non-TUI commands. The TUI path skips
//! installation so the alternate screen stays clean.

use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `verbose` lowers the default filter to
/// debug; an explicit RUST_LOG takes precedence.
pub fn init(verbose: bool) {
    let default_level = if verbose {
        "quotrack=debug"
    } else {
        "quotrack=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
