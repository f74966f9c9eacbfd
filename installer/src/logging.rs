//! Diagnostic logging setup for the installer binary.
//!
//! Library code logs through the `log` facade; the binary routes those
//! records into a `tracing-subscriber` formatter on stderr. `RUST_LOG`
//! takes precedence over the verbosity flags.

use tracing_subscriber::EnvFilter;

/// Filter directive for the given verbosity flags.
///
/// # Examples
///
/// ```
/// use todor_installer::logging::level_for;
///
/// assert_eq!(level_for(0, false), "warn");
/// assert_eq!(level_for(2, false), "debug");
/// assert_eq!(level_for(3, true), "error");
/// ```
#[must_use]
pub fn level_for(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Build the filter: `RUST_LOG` when set, else [`level_for`].
#[must_use]
pub fn filter_for(verbosity: u8, quiet: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbosity, quiet)))
}

/// Install the global subscriber.
///
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init(verbosity: u8, quiet: bool) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbosity, quiet))
        .with_writer(std::io::stderr)
        .with_target(true)
        .without_time()
        .try_init();
    if result.is_err() {
        // A subscriber is already installed.
    }
}
