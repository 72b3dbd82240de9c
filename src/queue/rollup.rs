// src/queue/rollup.rs

//! Read-only aggregate queries over the registry.

use std::time::Duration;

use tracing::debug;

use crate::job::TaskInfo;
use crate::queue::registry::{JobRegistry, JobView};
use crate::types::{JobKind, TaskStatus};

/// How long `queue_empty` waits for the registry lock before giving up.
const QUEUE_EMPTY_LOCK_TIMEOUT: Duration = Duration::from_millis(50);

/// Aggregate view across every job in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollupState {
    /// At least one job is running.
    pub has_active: bool,
    /// At least one job ended in error.
    pub has_errors: bool,
    /// Average percent complete over all jobs.
    pub percent_complete: u32,
}

impl RollupState {
    pub const IDLE: RollupState = RollupState {
        has_active: false,
        has_errors: false,
        percent_complete: 100,
    };
}

/// Fold a list of snapshots into a [`RollupState`].
///
/// Waiting jobs count 0, running jobs their progress, finished jobs 100.
pub fn rollup(tasks: &[TaskInfo]) -> RollupState {
    if tasks.is_empty() {
        return RollupState::IDLE;
    }

    let mut has_active = false;
    let mut has_errors = false;
    let mut sum: u32 = 0;
    let mut count: u32 = 0;

    for info in tasks {
        count += 1;
        match info.status {
            TaskStatus::Waiting => {}
            TaskStatus::Running => {
                sum += info.capped_progress();
                has_active = true;
            }
            TaskStatus::Error => {
                has_errors = true;
                sum += 100;
            }
            TaskStatus::Completed => {
                sum += 100;
            }
        }
    }

    RollupState {
        has_active,
        has_errors,
        percent_complete: if count == 0 { 0 } else { sum / count },
    }
}

impl JobRegistry {
    /// True iff the registry holds no jobs.
    ///
    /// If the lock cannot be taken in time the queue is reported as
    /// non-empty, so callers never see a false "idle".
    pub fn queue_empty(&self) -> bool {
        match self.state.try_lock_for(QUEUE_EMPTY_LOCK_TIMEOUT) {
            Some(state) => state.queue.is_empty(),
            None => {
                debug!("registry lock busy; reporting queue as non-empty");
                false
            }
        }
    }

    /// True while at least one job has no terminal snapshot.
    pub fn running_tasks_available(&self) -> bool {
        let state = self.state.lock();
        state.finished_infos.len() < state.queue.len()
    }

    /// True if at least one job has a terminal snapshot.
    pub fn completed_tasks_available(&self) -> bool {
        !self.state.lock().finished_infos.is_empty()
    }

    /// True if an unfinished job of `kind` is waiting or running.
    pub fn any_active_of_kind(&self, kind: JobKind) -> bool {
        self.views()
            .into_iter()
            .filter(|view| !view.is_finished())
            .map(JobView::into_task_info)
            .any(|info| info.kind == kind && info.status.is_active())
    }

    pub fn rollup_state(&self) -> RollupState {
        rollup(&self.current_tasks())
    }
}
