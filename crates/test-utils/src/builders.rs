#![allow(dead_code)]

use std::collections::BTreeMap;

use batchpool::config::{ConfigFile, JobConfig, PoolSection, RawConfigFile};
use batchpool::errors::Result;
use batchpool::jobs::PlaylistEntry;
use batchpool::types::JobKind;

/// Builder for `RawConfigFile` / `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                pool: PoolSection::default(),
                job: BTreeMap::new(),
            },
        }
    }

    pub fn with_job(mut self, key: &str, job: JobConfig) -> Self {
        self.config.job.insert(key.to_string(), job);
        self
    }

    pub fn with_workers(mut self, count: usize, auto_size: bool) -> Self {
        self.config.pool.worker_count = count;
        self.config.pool.auto_size = auto_size;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.pool.poll_interval_ms = ms;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    fn empty(kind: JobKind) -> Self {
        Self {
            job: JobConfig {
                kind,
                name: None,
                description: None,
                cmd: None,
                progress_pattern: None,
                output: None,
                extended: false,
                entries: vec![],
                after: None,
            },
        }
    }

    pub fn command(kind: JobKind, cmd: &str) -> Self {
        let mut b = Self::empty(kind);
        b.job.cmd = Some(cmd.to_string());
        b
    }

    pub fn playlist(output: &str) -> Self {
        let mut b = Self::empty(JobKind::PlaylistWrite);
        b.job.output = Some(output.to_string());
        b
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.job.after = Some(dep.to_string());
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.job.name = Some(name.to_string());
        self
    }

    pub fn progress_pattern(mut self, pattern: &str) -> Self {
        self.job.progress_pattern = Some(pattern.to_string());
        self
    }

    pub fn extended(mut self, val: bool) -> Self {
        self.job.extended = val;
        self
    }

    pub fn entry(mut self, entry: PlaylistEntry) -> Self {
        self.job.entries.push(entry);
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}
