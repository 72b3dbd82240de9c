// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod job;
pub mod jobs;
pub mod logging;
pub mod manager;
pub mod queue;
pub mod types;

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::loader::load_and_validate;
use crate::engine::{Monitor, RunSummary};
use crate::jobs::build_job;
use crate::manager::{TaskManager, TaskManagerConfig};
use crate::types::JobId;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job file loading
/// - the task manager and its worker pool
/// - job submission in dependency order
/// - the polling monitor and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let manager_config = manager_config_from(&cfg, &args);
    let poll_interval =
        Duration::from_millis(args.poll_interval_ms.unwrap_or(cfg.pool.poll_interval_ms).max(1));

    let manager = TaskManager::new(&manager_config)?;
    info!(workers = manager.worker_count(), "task manager ready");

    let ids = submit_config(&manager, &cfg)?;
    debug!(?ids, "all jobs submitted");

    let summary = Monitor::new(&manager, poll_interval)
        .run_until(ctrl_c())
        .await;

    print_summary(&summary);
    manager.shutdown();

    let failed = summary.failed().count();
    if failed > 0 {
        anyhow::bail!("{failed} job(s) failed");
    }
    if summary.interrupted {
        anyhow::bail!("interrupted before all jobs finished");
    }

    Ok(())
}

/// Submit every job of `cfg` in dependency order.
///
/// Returns the identity assigned to each job key.
pub fn submit_config(
    manager: &TaskManager,
    cfg: &ConfigFile,
) -> errors::Result<BTreeMap<String, JobId>> {
    let mut ids = BTreeMap::new();

    for key in cfg.submission_order() {
        let Some(job_cfg) = cfg.job.get(key) else {
            continue;
        };

        let job = build_job(key, job_cfg)?;
        let dependency = match &job_cfg.after {
            Some(dep) => Some(*ids.get(dep).ok_or_else(|| {
                errors::BatchpoolError::ConfigError(format!(
                    "job '{key}' depends on '{dep}', which was not submitted before it"
                ))
            })?),
            None => None,
        };

        let id = manager.submit_shared(job, dependency)?;
        ids.insert(key.clone(), id);
    }

    Ok(ids)
}

fn manager_config_from(cfg: &ConfigFile, args: &CliArgs) -> TaskManagerConfig {
    let mut config = cfg.manager_config();
    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }
    if let Some(auto_size) = args.auto_size {
        config.auto_size = auto_size;
    }
    config
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

fn print_dry_run(cfg: &ConfigFile) {
    println!("batchpool dry-run");
    println!("  pool.worker_count = {}", cfg.pool.worker_count);
    println!("  pool.auto_size = {}", cfg.pool.auto_size);
    println!("  pool.poll_interval_ms = {}", cfg.pool.poll_interval_ms);
    println!();

    println!("jobs in submission order ({}):", cfg.job.len());
    for key in cfg.submission_order() {
        let Some(job) = cfg.job.get(key) else { continue };
        println!("  - {key} ({})", job.kind);
        if let Some(ref name) = job.name {
            println!("      name: {name}");
        }
        if let Some(ref cmd) = job.cmd {
            println!("      cmd: {cmd}");
        }
        if let Some(ref output) = job.output {
            println!("      output: {output} ({} entries)", job.entries.len());
        }
        if let Some(ref after) = job.after {
            println!("      after: {after}");
        }
    }

    debug!("dry-run complete (no execution)");
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{:>5}  {:<14}  {:<10}  {:>4}  name",
        "id", "kind", "status", "%"
    );
    for task in &summary.tasks {
        println!(
            "{:>5}  {:<14}  {:<10}  {:>4}  {}",
            task.id.get(),
            task.kind.to_string(),
            task.status.to_string(),
            task.progress,
            task.name
        );
        if !task.description.is_empty() && task.status == types::TaskStatus::Error {
            for line in task.description.lines() {
                println!("{:>40}{}", "", line);
            }
        }
    }
    println!(
        "overall: {}% complete{}",
        summary.rollup.percent_complete,
        if summary.rollup.has_errors { ", with errors" } else { "" }
    );
}
