use std::collections::VecDeque;
use std::sync::Arc;

use batchpool::errors::Result;
use batchpool::exec::ExecutorBackend;
use batchpool::manager::TaskManager;
use batchpool::queue::ReadyJob;
use batchpool::types::JobId;
use parking_lot::Mutex;
use tracing::debug;

/// An executor backend that only collects dispatched jobs.
///
/// Tests decide when (and in which order) each job runs by passing it to
/// `TaskManager::execute_inline`.
#[derive(Clone, Default)]
pub struct ManualExecutor {
    queue: Arc<Mutex<VecDeque<ReadyJob>>>,
}

impl ManualExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager wired to a fresh manual executor.
    pub fn manager() -> (TaskManager, ManualExecutor) {
        let exec = ManualExecutor::new();
        let manager = TaskManager::with_backend(Box::new(exec.clone()));
        (manager, exec)
    }

    pub fn pending_ids(&self) -> Vec<JobId> {
        self.queue.lock().iter().map(|j| j.id).collect()
    }

    pub fn pop(&self) -> Option<ReadyJob> {
        self.queue.lock().pop_front()
    }

    /// Remove and return the dispatched job with `id`, if any.
    pub fn take(&self, id: JobId) -> Option<ReadyJob> {
        let mut queue = self.queue.lock();
        let pos = queue.iter().position(|j| j.id == id)?;
        queue.remove(pos)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Execute dispatched jobs one by one until nothing is left.
    pub fn drain(&self, manager: &TaskManager) -> usize {
        let mut executed = 0;
        while let Some(job) = self.pop() {
            manager.execute_inline(job);
            executed += 1;
        }
        executed
    }
}

impl ExecutorBackend for ManualExecutor {
    fn execute(&self, job: ReadyJob) -> Result<()> {
        debug!(job = %job.id, "manual executor: job queued");
        self.queue.lock().push_back(job);
        Ok(())
    }
}
