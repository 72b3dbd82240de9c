// src/exec/dispatcher.rs

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::exec::backend::ExecutorBackend;
use crate::queue::JobRegistry;

/// Moves jobs that passed the dependency gate onto the executor.
///
/// Eligibility is decided (and `started` flipped) inside the registry lock;
/// the lock is released before anything reaches the backend.
pub struct Dispatcher {
    registry: Arc<JobRegistry>,
    backend: Box<dyn ExecutorBackend>,
    accepting: AtomicBool,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("accepting", &self.accepting.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(registry: Arc<JobRegistry>, backend: Box<dyn ExecutorBackend>) -> Self {
        Self {
            registry,
            backend,
            accepting: AtomicBool::new(true),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Re-scan the registry and dispatch every job that became eligible.
    ///
    /// Returns the number of jobs handed to the backend.
    pub fn try_dispatch(&self) -> usize {
        if !self.is_accepting() {
            debug!("dispatcher closed; skipping re-scan");
            return 0;
        }

        let ready = self.registry.collect_ready();
        let mut dispatched = 0;

        for job in ready {
            let id = job.id;
            if let Err(e) = self.backend.execute(job.clone()) {
                // The job is already marked started; record it so it does not
                // sit in the queue forever.
                warn!(job = %id, error = %e, "failed to dispatch job");
                self.registry.record(&job, Some(format!("Dispatch failed: {e}")));
                continue;
            }
            info!(job = %id, kind = %job.kind, "job dispatched");
            dispatched += 1;
        }

        dispatched
    }

    /// Stop accepting new dispatch. Jobs already handed over are unaffected.
    pub fn close(&self) {
        self.accepting.store(false, Ordering::SeqCst);
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }
}
