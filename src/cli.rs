// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `batchpool`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "batchpool",
    version,
    about = "Run encoding, ripping and playlist jobs on a bounded worker pool.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Batchpool.toml")]
    pub config: String,

    /// Fixed number of worker threads (overrides `[pool].worker_count`).
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Size the pool to the hardware concurrency (overrides `[pool].auto_size`).
    #[arg(long, value_name = "BOOL")]
    pub auto_size: Option<bool>,

    /// Status poll interval in milliseconds (overrides `[pool].poll_interval_ms`).
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BATCHPOOL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the jobs in submission order, run nothing.
    #[arg(long)]
    pub dry_run: bool,
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

impl LogLevel {
    /// The level as an `EnvFilter` directive.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
