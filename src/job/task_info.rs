// src/job/task_info.rs

//! Point-in-time snapshots of a job.

use crate::types::{JobId, JobKind, TaskStatus};

/// Live state reported by a job body.
///
/// This is what a job knows about itself; the registry adds identity and
/// kind to turn it into a [`TaskInfo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveState {
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    /// Percent complete. Job bodies should stay within `0..=100`, but the
    /// recorder and the rollup clamp anyway.
    pub progress: u32,
}

impl LiveState {
    pub fn new(name: impl Into<String>, status: TaskStatus, progress: u32) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            status,
            progress,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Immutable snapshot of a job at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub id: JobId,
    pub name: String,
    pub description: String,
    pub kind: JobKind,
    pub status: TaskStatus,
    pub progress: u32,
}

impl TaskInfo {
    pub fn from_live(id: JobId, kind: JobKind, live: LiveState) -> Self {
        Self {
            id,
            name: live.name,
            description: live.description,
            kind,
            status: live.status,
            progress: live.progress,
        }
    }

    /// Progress clamped to `0..=100`.
    pub fn capped_progress(&self) -> u32 {
        self.progress.min(100)
    }
}
