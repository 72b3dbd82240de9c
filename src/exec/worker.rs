// src/exec/worker.rs

//! Worker body: run one job and hand its outcome to the completion recorder.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::exec::dispatcher::Dispatcher;
use crate::job::TaskInfo;
use crate::queue::ReadyJob;
use crate::types::TaskStatus;

/// Error text recorded when a job fails without a usable description.
pub const UNKNOWN_ERROR_TEXT: &str = "Unknown error";

/// Per-thread "busy" flags, for introspection only.
///
/// Guarded by its own lock; scheduling decisions never look at it.
#[derive(Debug, Default)]
pub struct BusyFlags {
    flags: Mutex<HashMap<ThreadId, bool>>,
}

impl BusyFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current(&self, busy: bool) {
        self.flags.lock().insert(thread::current().id(), busy);
    }

    pub fn busy_count(&self) -> usize {
        self.flags.lock().values().filter(|busy| **busy).count()
    }

    /// True if at least one thread is known and all known threads are busy.
    pub fn all_busy(&self) -> bool {
        let flags = self.flags.lock();
        !flags.is_empty() && flags.values().all(|busy| *busy)
    }
}

/// Execute `ready` on the current thread.
///
/// Whatever the job does, the outcome ends up as a terminal snapshot: an
/// `Err` from `run` becomes its error text, a panic becomes
/// [`UNKNOWN_ERROR_TEXT`]. Afterwards the registry is re-scanned so that
/// dependents of this job can start.
pub fn run_job(ready: ReadyJob, dispatcher: &Dispatcher, busy: &BusyFlags) -> TaskInfo {
    busy.set_current(true);
    info!(job = %ready.id, kind = %ready.kind, "job started");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| ready.job.run()));

    busy.set_current(false);

    let error_text = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(payload) => Some(panic_text(payload.as_ref())),
    };

    let info = dispatcher.registry().record(&ready, error_text);

    match info.status {
        TaskStatus::Error => warn!(
            job = %info.id,
            name = %info.name,
            description = %info.description,
            "job finished with error"
        ),
        status => info!(job = %info.id, name = %info.name, %status, "job finished"),
    }

    dispatcher.try_dispatch();

    info
}

pub(crate) fn panic_text(payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());

    match message {
        Some(msg) if !msg.is_empty() => format!("{UNKNOWN_ERROR_TEXT}: {msg}"),
        _ => UNKNOWN_ERROR_TEXT.to_string(),
    }
}
