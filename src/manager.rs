// src/manager.rs

//! The task manager: the single entry point the presentation layer talks to.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::{
    BusyFlags, ChannelBackend, Dispatcher, ExecutorBackend, WorkerPool,
    detect_hardware_concurrency, resolve_worker_count, run_job,
};
use crate::job::{Job, TaskInfo};
use crate::queue::{JobRegistry, ReadyJob, RollupState};
use crate::types::{JobId, JobKind};

/// Worker pool settings consumed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskManagerConfig {
    /// Fixed number of workers (used when `auto_size` is off or detection
    /// fails).
    pub worker_count: usize,
    /// Size the pool to the detected hardware concurrency.
    pub auto_size: bool,
}

impl Default for TaskManagerConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            auto_size: true,
        }
    }
}

/// Owns the job registry, the dispatcher and the worker pool.
///
/// Dropping the manager stops every job and joins the workers.
pub struct TaskManager {
    registry: Arc<JobRegistry>,
    dispatcher: Arc<Dispatcher>,
    busy: Arc<BusyFlags>,
    pool: Option<WorkerPool>,
}

impl fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskManager")
            .field("registry", &self.registry)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl TaskManager {
    /// Start a manager whose pool size is resolved against the detected
    /// hardware concurrency.
    pub fn new(config: &TaskManagerConfig) -> Result<Self> {
        Self::with_detected_concurrency(config, detect_hardware_concurrency())
    }

    /// Like [`TaskManager::new`], with the hardware concurrency supplied by
    /// the caller.
    pub fn with_detected_concurrency(config: &TaskManagerConfig, detected: usize) -> Result<Self> {
        let size = resolve_worker_count(config.auto_size, config.worker_count, detected);
        debug!(
            configured = config.worker_count,
            auto_size = config.auto_size,
            detected,
            resolved = size,
            "resolved worker pool size"
        );

        let registry = Arc::new(JobRegistry::new());
        let (jobs_tx, jobs_rx) = crossbeam_channel::unbounded::<ReadyJob>();
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&registry),
            Box::new(ChannelBackend::new(jobs_tx)),
        ));
        let busy = Arc::new(BusyFlags::new());

        let pool = WorkerPool::start(size, jobs_rx, Arc::clone(&dispatcher), Arc::clone(&busy))?;

        Ok(Self {
            registry,
            dispatcher,
            busy,
            pool: Some(pool),
        })
    }

    /// Build a manager without worker threads; ready jobs go to `backend`.
    ///
    /// Used by tests that want to step execution by hand via
    /// [`TaskManager::execute_inline`].
    pub fn with_backend(backend: Box<dyn ExecutorBackend>) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry), backend));

        Self {
            registry,
            dispatcher,
            busy: Arc::new(BusyFlags::new()),
            pool: None,
        }
    }

    /// Submit a job without a dependency. It may start immediately.
    pub fn submit(&self, job: impl Job + 'static) -> Result<JobId> {
        self.submit_shared(Arc::new(job), None)
    }

    /// Submit a job that may only start once `dependency` has finished.
    pub fn submit_after(&self, dependency: JobId, job: impl Job + 'static) -> Result<JobId> {
        self.submit_shared(Arc::new(job), Some(dependency))
    }

    /// Submit an already shared job handle.
    ///
    /// The handle must not be queued already; see [`JobRegistry::submit`].
    pub fn submit_shared(&self, job: Arc<dyn Job>, dependency: Option<JobId>) -> Result<JobId> {
        let id = self.registry.submit(job, dependency)?;
        self.dispatcher.try_dispatch();
        Ok(id)
    }

    /// Re-scan for jobs that became eligible. Returns how many were
    /// dispatched.
    pub fn dispatch_pending(&self) -> usize {
        self.dispatcher.try_dispatch()
    }

    /// Run a dispatched job on the calling thread, exactly as a worker would.
    pub fn execute_inline(&self, ready: ReadyJob) -> TaskInfo {
        run_job(ready, &self.dispatcher, &self.busy)
    }

    pub fn current_tasks(&self) -> Vec<TaskInfo> {
        self.registry.current_tasks()
    }

    pub fn remove_finished(&self) -> usize {
        self.registry.remove_finished()
    }

    pub fn remove_single(&self, id: JobId) -> Result<()> {
        self.registry.remove_single(id)
    }

    pub fn stop_all(&self) {
        self.registry.stop_all();
    }

    pub fn queue_empty(&self) -> bool {
        self.registry.queue_empty()
    }

    pub fn running_tasks_available(&self) -> bool {
        self.registry.running_tasks_available()
    }

    pub fn completed_tasks_available(&self) -> bool {
        self.registry.completed_tasks_available()
    }

    pub fn any_active_of_kind(&self, kind: JobKind) -> bool {
        self.registry.any_active_of_kind(kind)
    }

    pub fn rollup_state(&self) -> RollupState {
        self.registry.rollup_state()
    }

    /// Number of worker threads (0 for a manager built with a custom backend).
    pub fn worker_count(&self) -> usize {
        self.pool.as_ref().map_or(0, WorkerPool::size)
    }

    pub fn busy_workers(&self) -> usize {
        self.busy.busy_count()
    }

    pub fn all_workers_busy(&self) -> bool {
        self.busy.all_busy()
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Stop every job, stop dispatching and join the worker threads.
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        if !self.dispatcher.is_accepting() {
            return;
        }

        info!("task manager shutting down");
        self.registry.stop_all();
        self.dispatcher.close();

        if let Some(mut pool) = self.pool.take() {
            pool.shutdown();
        }
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}
