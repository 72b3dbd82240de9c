// src/jobs/command.rs

//! External command job (encoders, CD rippers, anything with a CLI).

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::job::{Job, JobError, LiveState};
use crate::types::{JobKind, TaskStatus};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy)]
struct Progress {
    status: TaskStatus,
    percent: u32,
}

type SharedProgress = Arc<Mutex<Progress>>;

/// Sent by a pipe reader thread once its pipe hit EOF.
enum ReaderDone {
    Stdout,
    Stderr(Option<String>),
}

/// Runs a shell command to completion on the worker thread.
///
/// Progress is taken from stdout lines matching `progress_pattern`; the
/// first capture group must be the percentage.
///
/// Both pipes are drained on helper threads. Processes started by the
/// command may keep the pipes open after the shell was killed, so a stopped
/// run never waits for the readers.
pub struct CommandJob {
    name: String,
    description: String,
    cmd: String,
    kind: JobKind,
    progress_pattern: Option<Regex>,
    progress: SharedProgress,
    child: Mutex<Option<Child>>,
    stop_requested: AtomicBool,
}

impl std::fmt::Debug for CommandJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandJob")
            .field("name", &self.name)
            .field("cmd", &self.cmd)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl CommandJob {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>, kind: JobKind) -> Self {
        let cmd = cmd.into();
        Self {
            name: name.into(),
            description: cmd.clone(),
            cmd,
            kind,
            progress_pattern: None,
            progress: Arc::new(Mutex::new(Progress {
                status: TaskStatus::Waiting,
                percent: 0,
            })),
            child: Mutex::new(None),
            stop_requested: AtomicBool::new(false),
        }
    }

    pub fn with_progress_pattern(mut self, pattern: Regex) -> Self {
        self.progress_pattern = Some(pattern);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn set_progress(&self, status: TaskStatus, percent: u32) {
        let mut progress = self.progress.lock();
        progress.status = status;
        progress.percent = percent.min(100);
    }

    fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    fn shell_command(&self) -> Command {
        if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        }
    }

    fn wait_for_exit(&self) -> Result<ExitStatus, JobError> {
        loop {
            {
                let mut guard = self.child.lock();
                let Some(child) = guard.as_mut() else {
                    return Err(JobError::Failed("child process handle lost".to_string()));
                };
                if let Some(status) = child.try_wait()? {
                    guard.take();
                    return Ok(status);
                }
            }
            thread::sleep(EXIT_POLL_INTERVAL);
        }
    }

    /// Wait for `pending` readers to report EOF.
    ///
    /// Returns `None` when a stop arrives first, otherwise the last stderr
    /// line (if any).
    fn wait_for_readers(
        &self,
        done_rx: &Receiver<ReaderDone>,
        mut pending: usize,
    ) -> Option<Option<String>> {
        let mut last_stderr = None;

        while pending > 0 {
            if self.is_stop_requested() {
                return None;
            }
            match done_rx.recv_timeout(EXIT_POLL_INTERVAL) {
                Ok(ReaderDone::Stdout) => pending -= 1,
                Ok(ReaderDone::Stderr(line)) => {
                    last_stderr = line;
                    pending -= 1;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        Some(last_stderr)
    }
}

impl Job for CommandJob {
    fn kind(&self) -> JobKind {
        self.kind
    }

    fn run(&self) -> Result<(), JobError> {
        if self.is_stop_requested() {
            return Err(JobError::Stopped);
        }

        info!(job = %self.name, cmd = %self.cmd, "starting command");
        self.set_progress(TaskStatus::Running, 0);

        let mut cmd = self.shell_command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            self.set_progress(TaskStatus::Error, 0);
            JobError::Failed(format!("could not start '{}': {e}", self.cmd))
        })?;

        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        let mut readers = 0;

        if let Some(stdout) = child.stdout.take() {
            let name = self.name.clone();
            let pattern = self.progress_pattern.clone();
            let progress = Arc::clone(&self.progress);
            let done_tx = done_tx.clone();
            thread::spawn(move || read_stdout(&name, stdout, pattern, &progress, &done_tx));
            readers += 1;
        }

        if let Some(stderr) = child.stderr.take() {
            let name = self.name.clone();
            let done_tx = done_tx.clone();
            thread::spawn(move || {
                // The receiver is gone if the run was stopped.
                let _ = done_tx.send(ReaderDone::Stderr(last_line(&name, stderr)));
            });
            readers += 1;
        }
        drop(done_tx);

        *self.child.lock() = Some(child);

        // stop() may have raced with spawn before the handle was stored.
        if self.is_stop_requested() {
            self.stop();
        }

        let status = self.wait_for_exit()?;
        let last_stderr = self.wait_for_readers(&done_rx, readers);

        let Some(last_stderr) = last_stderr.filter(|_| !self.is_stop_requested()) else {
            info!(job = %self.name, "command stopped");
            return Err(JobError::Stopped);
        };

        if status.success() {
            self.set_progress(TaskStatus::Completed, 100);
            return Ok(());
        }

        let percent = self.progress.lock().percent;
        self.set_progress(TaskStatus::Error, percent);

        let code = status.code().unwrap_or(-1);
        let text = match last_stderr {
            Some(line) => format!("exit code {code}: {line}"),
            None => format!("exit code {code}"),
        };
        Err(JobError::Failed(text))
    }

    fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);

        if let Some(child) = self.child.lock().as_mut() {
            if let Err(e) = child.kill() {
                debug!(job = %self.name, error = %e, "kill failed; process probably exited");
            }
        }
    }

    fn live_state(&self) -> LiveState {
        let progress = *self.progress.lock();
        LiveState::new(self.name.clone(), progress.status, progress.percent)
            .with_description(self.description.clone())
    }
}

fn read_stdout(
    name: &str,
    stdout: impl Read,
    pattern: Option<Regex>,
    progress: &SharedProgress,
    done_tx: &Sender<ReaderDone>,
) {
    for line in BufReader::new(stdout).lines() {
        let Ok(line) = line else { break };
        debug!(job = %name, "stdout: {}", line);

        if let Some(percent) = pattern.as_ref().and_then(|re| parse_percent(re, &line)) {
            let mut progress = progress.lock();
            // A late line must not turn a finished job back into Running.
            if progress.status == TaskStatus::Running {
                progress.percent = percent.min(100);
            }
        }
    }

    let _ = done_tx.send(ReaderDone::Stdout);
}

fn parse_percent(re: &Regex, line: &str) -> Option<u32> {
    let caps = re.captures(line)?;
    caps.get(1)?.as_str().trim().parse::<u32>().ok()
}

fn last_line(name: &str, stderr: impl Read) -> Option<String> {
    let mut last = None;
    for line in BufReader::new(stderr).lines() {
        match line {
            Ok(line) => {
                debug!(job = %name, "stderr: {}", line);
                if !line.trim().is_empty() {
                    last = Some(line.trim().to_string());
                }
            }
            Err(e) => {
                warn!(job = %name, error = %e, "error reading stderr");
                break;
            }
        }
    }
    last
}
