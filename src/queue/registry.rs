// src/queue/registry.rs

//! The job registry: ordered queue of all known jobs plus the side-tables
//! of terminal snapshots and finished identities.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::errors::{BatchpoolError, Result};
use crate::job::{Job, TaskInfo};
use crate::queue::gate::is_eligible;
use crate::queue::recorder::{effective_error_text, finalize_snapshot};
use crate::types::{JobId, JobKind};

/// Registry-side bookkeeping for one submitted job.
pub(crate) struct JobEntry {
    pub(crate) id: JobId,
    pub(crate) dependency: Option<JobId>,
    pub(crate) kind: JobKind,
    /// Flipped false -> true exactly once, under the registry lock, when the
    /// gate approved the job.
    pub(crate) started: bool,
    pub(crate) job: Arc<dyn Job>,
}

/// A job that passed the dependency gate and should be executed now.
#[derive(Clone)]
pub struct ReadyJob {
    pub id: JobId,
    pub kind: JobKind,
    pub job: Arc<dyn Job>,
    /// Queue generation the job was dispatched in.
    pub generation: u64,
}

impl fmt::Debug for ReadyJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyJob")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

pub(crate) struct RegistryState {
    /// All known jobs in submission order.
    pub(crate) queue: Vec<JobEntry>,
    /// Terminal snapshot per finished job still in the queue.
    pub(crate) finished_infos: HashMap<JobId, TaskInfo>,
    /// Identities that reached a terminal snapshot in this queue generation.
    pub(crate) finished_ids: HashSet<JobId>,
    /// Bumped by `stop_all`; completions from older generations never enter
    /// `finished_ids`.
    pub(crate) generation: u64,
    /// Next identity to hand out; `None` once `u32::MAX` has been used.
    next_id: Option<u32>,
}

impl RegistryState {
    fn starting_at(first: JobId) -> Self {
        Self {
            queue: Vec::new(),
            finished_infos: HashMap::new(),
            finished_ids: HashSet::new(),
            generation: 0,
            next_id: Some(first.get()),
        }
    }
}

/// Per-job view used by queries: either the stored terminal snapshot or a
/// handle to compute a live one outside the lock.
pub(crate) enum JobView {
    Finished(TaskInfo),
    Live {
        id: JobId,
        kind: JobKind,
        job: Arc<dyn Job>,
    },
}

impl JobView {
    pub(crate) fn is_finished(&self) -> bool {
        matches!(self, JobView::Finished(_))
    }

    pub(crate) fn into_task_info(self) -> TaskInfo {
        match self {
            JobView::Finished(info) => info,
            JobView::Live { id, kind, job } => TaskInfo::from_live(id, kind, job.live_state()),
        }
    }
}

/// Ordered collection of all known jobs, guarded by one lock.
///
/// The registry never executes anything itself. [`collect_ready`] decides
/// which jobs may start and marks them started; the caller hands them to an
/// executor after the lock has been released.
///
/// [`collect_ready`]: JobRegistry::collect_ready
pub struct JobRegistry {
    pub(crate) state: Mutex<RegistryState>,
}

impl fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("JobRegistry")
            .field("jobs", &state.queue.len())
            .field("finished", &state.finished_infos.len())
            .field("generation", &state.generation)
            .field("next_id", &state.next_id)
            .finish()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::with_first_id(JobId::new(1))
    }

    /// A registry whose first submitted job gets identity `first`.
    pub fn with_first_id(first: JobId) -> Self {
        Self {
            state: Mutex::new(RegistryState::starting_at(first)),
        }
    }

    /// Assign the next identity to `job` and append it to the queue.
    ///
    /// A handle that is already queued is a logic error: the same job body
    /// would run twice. It asserts in debug builds and is rejected with
    /// `AlreadyQueued` otherwise. Identities are never reused; once they
    /// run out every submission fails with `IdsExhausted`.
    ///
    /// Dispatch is the caller's business; see [`collect_ready`].
    ///
    /// [`collect_ready`]: JobRegistry::collect_ready
    pub fn submit(&self, job: Arc<dyn Job>, dependency: Option<JobId>) -> Result<JobId> {
        let kind = job.kind();
        let mut state = self.state.lock();

        let duplicate = state
            .queue
            .iter()
            .find(|entry| Arc::ptr_eq(&entry.job, &job))
            .map(|entry| entry.id);
        debug_assert!(duplicate.is_none(), "job submitted twice (already queued as {duplicate:?})");
        if let Some(existing) = duplicate {
            return Err(BatchpoolError::AlreadyQueued(existing));
        }

        let raw = state.next_id.ok_or(BatchpoolError::IdsExhausted)?;
        state.next_id = raw.checked_add(1);
        let id = JobId::new(raw);

        state.queue.push(JobEntry {
            id,
            dependency,
            kind,
            started: false,
            job,
        });
        drop(state);

        info!(job = %id, %kind, dependency = ?dependency.map(JobId::get), "job submitted");
        Ok(id)
    }

    /// Mark every eligible, not-yet-started, unfinished job as started and
    /// return it for execution.
    pub fn collect_ready(&self) -> Vec<ReadyJob> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let generation = state.generation;

        let mut ready = Vec::new();
        for entry in state.queue.iter_mut() {
            if entry.started || state.finished_infos.contains_key(&entry.id) {
                continue;
            }

            if !is_eligible(entry.dependency, &state.finished_ids) {
                debug!(
                    job = %entry.id,
                    dependency = ?entry.dependency.map(JobId::get),
                    "dependency not finished yet; job keeps waiting"
                );
                continue;
            }

            entry.started = true;
            debug!(job = %entry.id, "dependency satisfied; marking started");
            ready.push(ReadyJob {
                id: entry.id,
                kind: entry.kind,
                job: Arc::clone(&entry.job),
                generation,
            });
        }

        ready
    }

    /// Snapshot of every job in submission order.
    ///
    /// Finished jobs report their terminal snapshot; live snapshots are
    /// computed after the lock has been released.
    pub fn current_tasks(&self) -> Vec<TaskInfo> {
        self.views()
            .into_iter()
            .map(JobView::into_task_info)
            .collect()
    }

    pub(crate) fn views(&self) -> Vec<JobView> {
        let state = self.state.lock();
        state
            .queue
            .iter()
            .map(|entry| match state.finished_infos.get(&entry.id) {
                Some(info) => JobView::Finished(info.clone()),
                None => JobView::Live {
                    id: entry.id,
                    kind: entry.kind,
                    job: Arc::clone(&entry.job),
                },
            })
            .collect()
    }

    /// Record the terminal snapshot of a job that stopped running.
    ///
    /// `error_override` is the error text produced at the worker boundary;
    /// without it the job's own accumulated error text is used.
    pub fn record(&self, ready: &ReadyJob, error_override: Option<String>) -> TaskInfo {
        let live = TaskInfo::from_live(ready.id, ready.kind, ready.job.live_state());
        let error_text = effective_error_text(error_override, || ready.job.error_text());
        let info = finalize_snapshot(live, error_text.as_deref());

        let mut state = self.state.lock();
        store_terminal(&mut state, info.clone(), ready.generation);

        info
    }

    /// Prune every job that has a terminal snapshot.
    ///
    /// Returns the number of jobs removed.
    pub fn remove_finished(&self) -> usize {
        let mut state = self.state.lock();

        let finished: Vec<JobId> = state
            .queue
            .iter()
            .filter(|entry| state.finished_infos.contains_key(&entry.id))
            .map(|entry| entry.id)
            .collect();

        for id in &finished {
            if let Err(e) = remove_entry(&mut state, *id) {
                warn!(job = %id, error = %e, "finished job vanished while pruning");
            }
        }

        if !finished.is_empty() {
            debug!(removed = finished.len(), "removed finished jobs");
        }

        finished.len()
    }

    /// Forcibly stop every job and reset the finished-identity set.
    ///
    /// Jobs that already had a terminal snapshot keep it; every other job gets
    /// one recorded from whatever state it reports right after `stop`. A new
    /// queue generation starts: jobs still unwinding from the old one may
    /// refresh their snapshot but never re-enter the finished set.
    pub fn stop_all(&self) {
        let mut state = self.state.lock();

        info!(jobs = state.queue.len(), "stopping all jobs");

        let mut snapshots = Vec::new();
        for entry in state.queue.iter() {
            entry.job.stop();

            if state.finished_infos.contains_key(&entry.id) {
                continue;
            }

            let live = TaskInfo::from_live(entry.id, entry.kind, entry.job.live_state());
            let error_text = entry.job.error_text();
            snapshots.push(finalize_snapshot(live, error_text.as_deref()));
        }

        for info in snapshots {
            state.finished_infos.insert(info.id, info);
        }

        state.finished_ids.clear();
        state.generation += 1;
    }

    /// Stop one job and remove it, along with any stored snapshot.
    ///
    /// The job must still be in the queue; anything else is a logic error.
    pub fn remove_single(&self, id: JobId) -> Result<()> {
        let mut state = self.state.lock();
        let result = remove_entry(&mut state, id);
        debug_assert!(result.is_ok(), "job {id} not in queue anymore");
        result
    }

    pub fn job_count(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn finished_count(&self) -> usize {
        self.state.lock().finished_infos.len()
    }

    /// Whether `id` is in the finished-identity set of this generation.
    pub fn is_finished(&self, id: JobId) -> bool {
        self.state.lock().finished_ids.contains(&id)
    }
}

fn store_terminal(state: &mut RegistryState, info: TaskInfo, generation: u64) {
    let id = info.id;

    if state.queue.iter().any(|entry| entry.id == id) {
        debug!(job = %id, status = %info.status, progress = info.progress, "storing terminal snapshot");
        state.finished_infos.insert(id, info);
    } else {
        debug!(job = %id, "job already pruned; dropping its terminal snapshot");
    }

    if generation == state.generation {
        state.finished_ids.insert(id);
    } else {
        debug!(job = %id, generation, current = state.generation, "completion from a stopped generation");
    }
}

fn remove_entry(state: &mut RegistryState, id: JobId) -> Result<()> {
    let pos = state
        .queue
        .iter()
        .position(|entry| entry.id == id)
        .ok_or(BatchpoolError::JobNotFound(id))?;

    let entry = state.queue.remove(pos);
    entry.job.stop();
    state.finished_infos.remove(&id);

    Ok(())
}
