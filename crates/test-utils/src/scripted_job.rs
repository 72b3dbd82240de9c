use std::sync::Arc;

use batchpool::job::{Job, JobError, LiveState};
use batchpool::types::{JobKind, TaskStatus};
use parking_lot::{Condvar, Mutex};

/// Shared, ordered record of `start:<name>` / `end:<name>` events.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: String) {
        self.0.lock().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == event)
    }
}

/// How a scripted job ends once it is allowed to finish.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Report Completed.
    Succeed,
    /// Return `JobError::Failed` with this text.
    Fail(String),
    /// Panic with this message.
    Panic(String),
    /// Return `Ok` but leave this text in the error accumulator.
    AccumulateError(String),
}

#[derive(Debug, Clone, Copy)]
struct State {
    status: TaskStatus,
    progress: u32,
    released: bool,
    stopped: bool,
}

/// A job whose behaviour is scripted by the test.
///
/// Without a gate it finishes immediately; with a gate `run` blocks until
/// [`ScriptedJob::release`] or `stop` is called.
pub struct ScriptedJob {
    name: String,
    kind: JobKind,
    outcome: Outcome,
    /// Live progress reported when the run ends (before recording).
    final_progress: u32,
    state: Mutex<State>,
    changed: Condvar,
    error_text: Mutex<Option<String>>,
    log: Option<EventLog>,
}

impl ScriptedJob {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: JobKind::Unknown,
            outcome: Outcome::Succeed,
            final_progress: 100,
            state: Mutex::new(State {
                status: TaskStatus::Waiting,
                progress: 0,
                released: true,
                stopped: false,
            }),
            changed: Condvar::new(),
            error_text: Mutex::new(None),
            log: None,
        }
    }

    pub fn of_kind(mut self, kind: JobKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn final_progress(mut self, progress: u32) -> Self {
        self.final_progress = progress;
        self
    }

    /// Block `run` until released or stopped.
    pub fn gated(self) -> Self {
        self.state.lock().released = false;
        self
    }

    pub fn logging_to(mut self, log: &EventLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    /// Set the progress a running job reports.
    pub fn report_progress(&self, progress: u32) {
        self.state.lock().progress = progress;
    }

    pub fn release(&self) {
        self.state.lock().released = true;
        self.changed.notify_all();
    }

    pub fn was_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn log(&self, event: &str) {
        if let Some(log) = &self.log {
            log.push(format!("{event}:{}", self.name));
        }
    }
}

impl Job for ScriptedJob {
    fn kind(&self) -> JobKind {
        self.kind
    }

    fn run(&self) -> Result<(), JobError> {
        self.log("start");

        let stopped = {
            let mut state = self.state.lock();
            state.status = TaskStatus::Running;
            while !state.released && !state.stopped {
                self.changed.wait(&mut state);
            }
            state.progress = self.final_progress;
            state.stopped
        };

        self.log("end");

        if stopped {
            return Err(JobError::Stopped);
        }

        match &self.outcome {
            Outcome::Succeed => {
                self.state.lock().status = TaskStatus::Completed;
                Ok(())
            }
            Outcome::Fail(text) => Err(JobError::Failed(text.clone())),
            Outcome::Panic(msg) => panic!("{}", msg),
            Outcome::AccumulateError(text) => {
                *self.error_text.lock() = Some(text.clone());
                Ok(())
            }
        }
    }

    fn stop(&self) {
        self.state.lock().stopped = true;
        self.changed.notify_all();
    }

    fn live_state(&self) -> LiveState {
        let state = *self.state.lock();
        LiveState::new(self.name.clone(), state.status, state.progress)
            .with_description(format!("scripted job {}", self.name))
    }

    fn error_text(&self) -> Option<String> {
        self.error_text.lock().clone()
    }
}
