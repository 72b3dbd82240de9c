// src/exec/pool.rs

//! Fixed-size pool of long-lived worker threads.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, select};
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::exec::dispatcher::Dispatcher;
use crate::exec::worker::{BusyFlags, panic_text, run_job};
use crate::queue::ReadyJob;

/// Pool size used when neither detection nor configuration yields a count.
pub const MIN_WORKERS: usize = 2;

/// Number of hardware threads, or 0 if it cannot be determined.
pub fn detect_hardware_concurrency() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(0)
}

/// Decide how many workers to start.
///
/// With `auto_size` the detected concurrency wins, falling back to the
/// configured count when detection gave 0. A resulting 0 becomes
/// [`MIN_WORKERS`].
pub fn resolve_worker_count(auto_size: bool, configured: usize, detected: usize) -> usize {
    let mut count = configured;

    if auto_size {
        count = if detected == 0 { configured } else { detected };
    }

    if count == 0 { MIN_WORKERS } else { count }
}

/// Long-lived worker threads pulling from one shared dispatch queue.
///
/// Workers stay alive as long as the pool holds its keep-alive token.
/// Releasing the token (in [`WorkerPool::shutdown`]) disconnects the token
/// channel, which every worker observes and exits on.
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
    keep_alive: Option<Sender<()>>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("running", &self.keep_alive.is_some())
            .finish()
    }
}

impl WorkerPool {
    pub fn start(
        size: usize,
        jobs_rx: Receiver<ReadyJob>,
        dispatcher: Arc<Dispatcher>,
        busy: Arc<BusyFlags>,
    ) -> Result<Self> {
        let (keep_alive_tx, keep_alive_rx) = crossbeam_channel::bounded::<()>(0);

        info!(workers = size, "starting worker pool");

        let mut workers = Vec::with_capacity(size);
        for number in 0..size {
            let jobs_rx = jobs_rx.clone();
            let keep_alive_rx = keep_alive_rx.clone();
            let dispatcher = Arc::clone(&dispatcher);
            let busy = Arc::clone(&busy);

            let handle = thread::Builder::new()
                .name(format!("worker thread #{number}"))
                .spawn(move || worker_loop(number, jobs_rx, keep_alive_rx, dispatcher, busy))?;

            workers.push(handle);
        }

        Ok(Self {
            workers,
            keep_alive: Some(keep_alive_tx),
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Release the keep-alive token and join every worker.
    ///
    /// Workers finish the job they are executing first.
    pub fn shutdown(&mut self) {
        if self.keep_alive.take().is_none() {
            return;
        }

        info!(workers = self.workers.len(), "shutting down worker pool");

        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if let Err(payload) = handle.join() {
                error!(
                    worker = %name,
                    error = %panic_text(payload.as_ref()),
                    "worker thread terminated abnormally"
                );
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    number: usize,
    jobs_rx: Receiver<ReadyJob>,
    keep_alive_rx: Receiver<()>,
    dispatcher: Arc<Dispatcher>,
    busy: Arc<BusyFlags>,
) {
    debug!(worker = number, "worker thread started");
    busy.set_current(false);

    loop {
        select! {
            recv(jobs_rx) -> msg => match msg {
                Ok(ready) => {
                    let job = ready.id;
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        run_job(ready, &dispatcher, &busy);
                    }));

                    if let Err(payload) = result {
                        error!(
                            worker = number,
                            %job,
                            error = %panic_text(payload.as_ref()),
                            "fatal error in worker run loop; worker exits"
                        );
                        break;
                    }
                }
                Err(_) => {
                    debug!(worker = number, "dispatch queue closed");
                    break;
                }
            },
            recv(keep_alive_rx) -> _ => {
                debug!(worker = number, "keep-alive token released");
                break;
            }
        }
    }

    debug!(worker = number, "worker thread finished");
}
