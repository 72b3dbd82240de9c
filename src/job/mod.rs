// src/job/mod.rs

//! The job contract consumed by the scheduling core.
//!
//! A job is an opaque unit of background work. The core never looks inside
//! it: it only runs it, asks it to stop, and reads its live state.
//!
//! - [`task_info`] holds the snapshot types ([`LiveState`], [`TaskInfo`]).

pub mod task_info;

use thiserror::Error;

pub use task_info::{LiveState, TaskInfo};

use crate::types::JobKind;

/// Failure reported by a job body.
///
/// The `Display` output is the error text that ends up in the job's
/// terminal snapshot.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("{0}")]
    Failed(String),

    #[error("Stopped")]
    Stopped,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A runnable, stoppable unit of background work.
///
/// Implementations must tolerate being called from several threads at once:
/// `live_state` is polled by the presentation layer while `run` executes on
/// a worker thread, and `stop` may arrive from yet another thread.
pub trait Job: Send + Sync {
    /// Kind tag used by rollups such as "any CD extraction still active".
    fn kind(&self) -> JobKind {
        JobKind::Unknown
    }

    /// Execute the job synchronously until it finishes, fails or is stopped.
    fn run(&self) -> Result<(), JobError>;

    /// Request cooperative early termination.
    ///
    /// Must be a no-op when the job already finished or never started.
    fn stop(&self);

    /// Current state of the job. Must not block on `run` completing.
    fn live_state(&self) -> LiveState;

    /// Error text accumulated by the job body itself, if any.
    ///
    /// Used by the completion recorder when the run did not report an
    /// error of its own.
    fn error_text(&self) -> Option<String> {
        None
    }
}
