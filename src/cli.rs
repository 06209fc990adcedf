// src/cli.rs

//! Command line of the `buildo` binary.

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;

/// Command-line arguments for `buildo`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildo",
    version,
    about = "Incremental, parallel builds for C projects.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the project file (TOML).
    ///
    /// The directory containing it is the project root. A missing file means
    /// "use the defaults".
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Use one worker per available CPU.
    #[arg(short, long)]
    pub multitask: bool,

    /// Number of worker threads.
    #[arg(short, long, value_name = "N", default_value_t = 1)]
    pub jobs: usize,

    /// Variants to build (default: all). `clean` removes the output directory.
    #[arg(short, long, value_name = "TARGET", num_args = 0..)]
    pub targets: Vec<String>,

    /// Persist a configuration value before building, e.g. `--set cc=clang`.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub overrides: Vec<(String, String)>,

    /// Print what would be rebuilt, without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Log level for every module.
    ///
    /// Takes precedence over `-v`; if neither is given, `BUILDO_LOG` or a
    /// default level is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    /// Worker count after applying `--multitask`.
    pub fn worker_count(&self) -> usize {
        if self.multitask {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.jobs.max(1)
        }
    }

    /// Log level after folding `-v` into `--log-level`.
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        self.log_level.or(match self.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        })
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

/// Parse `std::env::args`, exiting with usage on error.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
