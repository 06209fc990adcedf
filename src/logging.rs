// src/logging.rs

//! `tracing-subscriber` setup for the `buildo` binary.
//!
//! The filter comes from, in order:
//! 1. `--log-level` or `-v` on the command line (applies to every target)
//! 2. `BUILDO_LOG`, read as an `EnvFilter` directive string, so
//!    `BUILDO_LOG=info,buildo::dag=trace` narrows noise to one module
//! 3. `info`
//!
//! Output goes to stderr with thread names, so lines from different
//! workers can be told apart.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable holding a filter directive.
pub const LOG_ENV: &str = "BUILDO_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(directive(level)),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
