// src/logging.rs

//! `tracing` subscriber for the `batchpool` binary.
//!
//! The filter comes from `--log-level` when given, otherwise from the
//! directives in `BATCHPOOL_LOG` (for example `info,batchpool::exec=debug`),
//! otherwise `info`. Output goes to stderr with worker thread names; the
//! final status table is the only thing printed on stdout.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "BATCHPOOL_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env_value.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

/// Resolve the filter from the CLI level and the raw `BATCHPOOL_LOG` value.
///
/// Unparseable directives fall back to the default with a note on stderr,
/// since no subscriber exists yet to report it.
pub fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level.as_directive());
    }

    let Some(directives) = env_value.map(str::trim).filter(|v| !v.is_empty()) else {
        return EnvFilter::new(DEFAULT_DIRECTIVE);
    };

    EnvFilter::try_new(directives).unwrap_or_else(|e| {
        eprintln!("ignoring {LOG_ENV_VAR}={directives:?}: {e}");
        EnvFilter::new(DEFAULT_DIRECTIVE)
    })
}
