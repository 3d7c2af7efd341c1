//! Logging initialization.
//!
//! - JSON lines when `json` is set or `SIGTRADER_LOG_FORMAT=json`
//! - Otherwise colourful, human-readable output
//!
//! Filtering follows `RUST_LOG`, defaulting to `info`. Logs go to stderr so
//! command output on stdout stays clean.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FORMAT_ENV: &str = "SIGTRADER_LOG_FORMAT";

pub fn json_requested(flag: bool) -> bool {
    flag || std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if json_requested(json) {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    // Already initialised (tests, embedding binaries): keep the existing one.
    let _ = result;
}
