// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BatchpoolError, Result};
use crate::types::JobKind;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BatchpoolError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let order = submission_order(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.pool, raw.job, order))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_pool(cfg)?;
    validate_job_bodies(cfg)?;
    validate_dependencies(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(BatchpoolError::ConfigError(
            "config must contain at least one [job.<key>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_pool(cfg: &RawConfigFile) -> Result<()> {
    // worker_count = 0 is fine: the pool falls back to its minimum size.
    if cfg.pool.poll_interval_ms == 0 {
        return Err(BatchpoolError::ConfigError(
            "[pool].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_job_bodies(cfg: &RawConfigFile) -> Result<()> {
    for (key, job) in cfg.job.iter() {
        if job.kind == JobKind::PlaylistWrite {
            if job.output.as_deref().is_none_or(|o| o.trim().is_empty()) {
                return Err(BatchpoolError::ConfigError(format!(
                    "playlist job '{key}' needs an `output` file"
                )));
            }
            continue;
        }

        if job.cmd.as_deref().is_none_or(|c| c.trim().is_empty()) {
            return Err(BatchpoolError::ConfigError(format!(
                "job '{key}' of kind {} needs a `cmd`",
                job.kind
            )));
        }

        if let Some(pattern) = &job.progress_pattern {
            let re = Regex::new(pattern).map_err(|e| {
                BatchpoolError::ConfigError(format!(
                    "job '{key}' has an invalid progress_pattern: {e}"
                ))
            })?;
            if re.captures_len() < 2 {
                return Err(BatchpoolError::ConfigError(format!(
                    "job '{key}' progress_pattern needs a capture group for the percentage"
                )));
            }
        }
    }
    Ok(())
}

fn validate_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (key, job) in cfg.job.iter() {
        let Some(dep) = &job.after else { continue };

        if !cfg.job.contains_key(dep) {
            return Err(BatchpoolError::ConfigError(format!(
                "job '{}' has unknown dependency '{}' in `after`",
                key, dep
            )));
        }
        if dep == key {
            return Err(BatchpoolError::ConfigError(format!(
                "job '{}' cannot depend on itself in `after`",
                key
            )));
        }
    }
    Ok(())
}

/// Topological order of the job keys.
///
/// Identities are assigned at submission, so a dependency has to be
/// submitted before the jobs that name it.
fn submission_order(cfg: &RawConfigFile) -> Result<Vec<String>> {
    // Edge direction: dep -> job
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for key in cfg.job.keys() {
        graph.add_node(key.as_str());
    }

    for (key, job) in cfg.job.iter() {
        if let Some(dep) = &job.after {
            graph.add_edge(dep.as_str(), key.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(BatchpoolError::DependencyCycle(format!(
            "cycle detected in job dependencies involving job '{}'",
            cycle.node_id()
        ))),
    }
}
