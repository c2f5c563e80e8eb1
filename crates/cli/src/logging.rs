//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Library crates only emit events; the binary decides where they go. Logs
//! are written to stderr so stdout stays reserved for command output.
//!
//! # Log Levels
//!
//! - `warn`: wrapper deviations and other recoverable oddities (default)
//! - `info`: files read and written, record counts (`-v`)
//! - `debug`: lookups and edits (`-vv`)
//! - `trace`: tree construction (`-vvv`)

use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub(crate) struct LogConfig {
    /// Level for the toolchain's own crates.
    pub(crate) level: Level,
    /// Whether to use ANSI colors.
    pub(crate) with_ansi: bool,
}

impl LogConfig {
    /// Map the repeatable `-v` count to a level.
    pub(crate) fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            with_ansi: io::stderr().is_terminal(),
        }
    }
}

/// Install the global subscriber. Call once at startup.
pub(crate) fn init_logging(config: &LogConfig) {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(false)
        .without_time();
    tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(layer)
        .init();
}

/// Build an `EnvFilter` from the given level, respecting `RUST_LOG`.
fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Other crates stay at warn.
        let level = level.as_str().to_lowercase();
        EnvFilter::new(format!(
            "warn,odl_toolchain_core={level},odl_toolchain_cli={level}"
        ))
    })
}
