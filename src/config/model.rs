// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::jobs::PlaylistEntry;
use crate::manager::TaskManagerConfig;
use crate::types::JobKind;

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [pool]
/// worker_count = 4
/// auto_size = false
///
/// [job.rip1]
/// kind = "cd_extraction"
/// cmd = "ripper --track 1 track1.wav"
///
/// [job.encode1]
/// kind = "encoding"
/// cmd = "encoder track1.wav track1.mp3"
/// progress_pattern = '(\d+)%'
/// after = "rip1"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Worker pool settings from `[pool]`.
    #[serde(default)]
    pub pool: PoolSection,

    /// All jobs from `[job.<key>]`.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so the dependency
/// structure is known to be acyclic and every `after` resolves.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub pool: PoolSection,
    pub job: BTreeMap<String, JobConfig>,
    /// Job keys ordered so that every dependency precedes its dependents.
    submission_order: Vec<String>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        pool: PoolSection,
        job: BTreeMap<String, JobConfig>,
        submission_order: Vec<String>,
    ) -> Self {
        Self {
            pool,
            job,
            submission_order,
        }
    }

    /// Job keys in the order they must be submitted.
    pub fn submission_order(&self) -> &[String] {
        &self.submission_order
    }

    pub fn manager_config(&self) -> TaskManagerConfig {
        TaskManagerConfig {
            worker_count: self.pool.worker_count,
            auto_size: self.pool.auto_size,
        }
    }
}

/// `[pool]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolSection {
    /// Fixed worker count, used when `auto_size` is off or detection fails.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Size the pool to the machine's hardware concurrency.
    #[serde(default = "default_auto_size")]
    pub auto_size: bool,

    /// How often the monitor polls the task list, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_worker_count() -> usize {
    2
}

fn default_auto_size() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    200
}

impl Default for PoolSection {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            auto_size: default_auto_size(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// `[job.<key>]` section.
///
/// Playlist jobs use `output`, `extended` and `entries`; every other kind
/// runs `cmd`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub kind: JobKind,

    /// Display name; defaults to the job key.
    #[serde(default)]
    pub name: Option<String>,

    /// Free-text description shown with the task.
    #[serde(default)]
    pub description: Option<String>,

    /// Shell command for non-playlist jobs.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Regex whose first capture group is a percentage found on stdout.
    #[serde(default)]
    pub progress_pattern: Option<String>,

    /// Playlist file to write.
    #[serde(default)]
    pub output: Option<String>,

    /// Write `#EXTM3U` / `#EXTINF` lines.
    #[serde(default)]
    pub extended: bool,

    #[serde(default)]
    pub entries: Vec<PlaylistEntry>,

    /// Key of the job that must finish before this one starts.
    #[serde(default)]
    pub after: Option<String>,
}

impl JobConfig {
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(key)
    }
}
