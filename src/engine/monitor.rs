// src/engine/monitor.rs

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::job::TaskInfo;
use crate::manager::TaskManager;
use crate::queue::RollupState;
use crate::queue::rollup::rollup;
use crate::types::{JobId, TaskStatus};

/// Final state reported when the monitor stops.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub tasks: Vec<TaskInfo>,
    pub rollup: RollupState,
    /// Shutdown was requested before every job finished.
    pub interrupted: bool,
}

impl RunSummary {
    pub fn failed(&self) -> impl Iterator<Item = &TaskInfo> {
        self.tasks.iter().filter(|t| t.status == TaskStatus::Error)
    }
}

/// Polls a [`TaskManager`] on a fixed interval and reports changes.
///
/// The manager pushes nothing; every update the monitor logs comes from
/// `current_tasks` / `rollup_state` snapshots.
pub struct Monitor<'a> {
    manager: &'a TaskManager,
    poll_interval: Duration,
    last_rollup: Option<RollupState>,
    last_status: HashMap<JobId, TaskStatus>,
}

impl<'a> Monitor<'a> {
    pub fn new(manager: &'a TaskManager, poll_interval: Duration) -> Self {
        Self {
            manager,
            poll_interval,
            last_rollup: None,
            last_status: HashMap::new(),
        }
    }

    /// Poll until no job is left without a terminal snapshot.
    ///
    /// When `shutdown` resolves first, every job is stopped; polling then
    /// continues until the stop-time snapshots are in place.
    pub async fn run_until<F>(mut self, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);
        let mut interrupted = false;

        info!(interval_ms = self.poll_interval.as_millis() as u64, "monitor started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll();
                    if !self.manager.running_tasks_available() {
                        return self.summary(interrupted);
                    }
                }
                _ = &mut shutdown, if !interrupted => {
                    warn!("shutdown requested; stopping all jobs");
                    interrupted = true;
                    self.manager.stop_all();
                }
            }
        }
    }

    /// Take one snapshot, log what changed since the previous poll.
    pub fn poll(&mut self) -> Vec<TaskInfo> {
        let tasks = self.manager.current_tasks();

        for task in &tasks {
            let previous = self.last_status.insert(task.id, task.status);
            if previous != Some(task.status) {
                match task.status {
                    TaskStatus::Error => warn!(
                        job = %task.id,
                        name = %task.name,
                        description = %task.description,
                        "task failed"
                    ),
                    status => info!(
                        job = %task.id,
                        name = %task.name,
                        kind = %task.kind,
                        %status,
                        progress = task.progress,
                        "task status changed"
                    ),
                }
            }
        }

        let rollup = self.manager.rollup_state();
        if self.last_rollup != Some(rollup) {
            debug!(
                active = rollup.has_active,
                errors = rollup.has_errors,
                percent = rollup.percent_complete,
                busy_workers = self.manager.busy_workers(),
                "overall progress"
            );
            self.last_rollup = Some(rollup);
        }

        tasks
    }

    fn summary(&self, interrupted: bool) -> RunSummary {
        let tasks = self.manager.current_tasks();
        let rollup = rollup(&tasks);

        RunSummary {
            tasks,
            rollup,
            interrupted,
        }
    }
}
