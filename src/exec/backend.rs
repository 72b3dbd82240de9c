// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The dispatcher hands ready jobs to an `ExecutorBackend` instead of a raw
//! channel sender. This makes it easy to swap in a manual executor in tests
//! while production code feeds the worker pool.
//!
//! - `ChannelBackend` is the default implementation. It pushes ready jobs
//!   onto the pool's shared dispatch queue.
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which jobs were dispatched and runs them on demand.

use crossbeam_channel::Sender;

use crate::errors::Result;
use crate::queue::ReadyJob;

/// Trait abstracting how ready jobs get executed.
pub trait ExecutorBackend: Send + Sync {
    /// Accept one job for execution. Must not block on the job running.
    fn execute(&self, job: ReadyJob) -> Result<()>;
}

/// Backend feeding the worker pool's dispatch queue.
pub struct ChannelBackend {
    tx: Sender<ReadyJob>,
}

impl ChannelBackend {
    pub fn new(tx: Sender<ReadyJob>) -> Self {
        Self { tx }
    }
}

impl ExecutorBackend for ChannelBackend {
    fn execute(&self, job: ReadyJob) -> Result<()> {
        self.tx
            .send(job)
            .map_err(|e| anyhow::anyhow!("dispatch queue closed; dropping job {}", e.0.id))?;
        Ok(())
    }
}
