// src/jobs/mod.rs

//! Concrete job bodies used by the `batchpool` binary.
//!
//! - [`command`] runs an external program (encoder, ripper, ...) and parses
//!   its progress from stdout.
//! - [`playlist`] writes an M3U playlist of the produced files.

pub mod command;
pub mod playlist;

pub use command::CommandJob;
pub use playlist::{PlaylistEntry, PlaylistJob};

use std::sync::Arc;

use regex::Regex;

use crate::config::JobConfig;
use crate::errors::{BatchpoolError, Result};
use crate::job::Job;
use crate::types::JobKind;

/// Build the job body described by a validated `[job.<key>]` section.
pub fn build_job(key: &str, cfg: &JobConfig) -> Result<Arc<dyn Job>> {
    if cfg.kind == JobKind::PlaylistWrite {
        let output = cfg.output.as_deref().ok_or_else(|| {
            BatchpoolError::ConfigError(format!("playlist job '{key}' needs an `output` file"))
        })?;
        return Ok(Arc::new(PlaylistJob::new(
            output,
            cfg.extended,
            cfg.entries.clone(),
        )));
    }

    let cmd = cfg
        .cmd
        .as_deref()
        .ok_or_else(|| BatchpoolError::ConfigError(format!("job '{key}' needs a `cmd`")))?;

    let mut job = CommandJob::new(cfg.display_name(key), cmd, cfg.kind);

    if let Some(description) = &cfg.description {
        job = job.with_description(description.clone());
    }

    if let Some(pattern) = &cfg.progress_pattern {
        let re = Regex::new(pattern).map_err(|e| {
            BatchpoolError::ConfigError(format!("job '{key}' has an invalid progress_pattern: {e}"))
        })?;
        job = job.with_progress_pattern(re);
    }

    Ok(Arc::new(job))
}
