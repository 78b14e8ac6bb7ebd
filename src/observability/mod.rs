//! Logging setup for the `rxrank` binary
//!
//! Library code only emits `tracing` events. The binary installs one
//! subscriber writing to stderr; stdout carries the JSON responses.
//!
//! The filter is taken from the first source that parses: `RXRANK_LOG`,
//! then `RUST_LOG`, then the `--verbose`/`--quiet` flags.

use std::io::IsTerminal;

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "RXRANK_LOG";

/// Directives implied by the CLI flags; `--verbose` wins over `--quiet`
pub fn flag_directives(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (true, _) => "warn,rxrank=debug",
        (false, true) => "error",
        (false, false) => "warn",
    }
}

/// Picks the filter from explicit directives, falling back to the flags.
/// Unparseable directives are skipped.
pub fn log_filter(
    project: Option<&str>,
    rust_log: Option<&str>,
    verbose: bool,
    quiet: bool,
) -> EnvFilter {
    [project, rust_log]
        .into_iter()
        .flatten()
        .find_map(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(flag_directives(verbose, quiet)))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logging(verbose: bool, quiet: bool, no_color: bool) -> Result<(), TryInitError> {
    let project = std::env::var(LOG_ENV).ok();
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(project.as_deref(), rust_log.as_deref(), verbose, quiet);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color && std::io::stderr().is_terminal())
        .with_target(verbose)
        .finish()
        .try_init()
}
