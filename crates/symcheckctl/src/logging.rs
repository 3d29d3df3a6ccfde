//! Logging setup for symcheckctl
//!
//! Logs go to stderr so the interactive prompts on stdout stay readable.
//! `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::EnvFilter;

/// Filter directive for the given configured level.
pub fn directive(level: &str, verbose: bool) -> String {
    if verbose {
        return "debug".to_string();
    }
    match level.trim().to_ascii_lowercase().as_str() {
        l @ ("trace" | "debug" | "info" | "warn" | "error" | "off") => l.to_string(),
        _ => "info".to_string(),
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(level: &str, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive(level, verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
