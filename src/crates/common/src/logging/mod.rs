//! Logging utilities
//!
//! All crates in the workspace log through `tracing`. Binaries and tests that
//! want to see the output call [`init_logging`] once; libraries never install
//! a subscriber themselves.

use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Install a `tracing-subscriber` fmt subscriber
///
/// The filter is taken from `RUST_LOG` when set, otherwise from
/// `default_filter` (e.g. `"info"` or `"agentic_task=debug"`).
///
/// Returns `false` if a global subscriber was already installed, which makes
/// the call safe to repeat from several tests.
pub fn init_logging(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Format duration in human-readable form
///
/// # Example
///
/// ```rust
/// use agentic_common::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
/// assert_eq!(format_duration(Duration::from_micros(500)), "500μs");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();

    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{}ms", micros / 1000)
    } else if micros < 60_000_000 {
        format!("{:.2}s", micros as f64 / 1_000_000.0)
    } else {
        let seconds = micros / 1_000_000;
        format!("{}m{}s", seconds / 60, seconds % 60)
    }
}
