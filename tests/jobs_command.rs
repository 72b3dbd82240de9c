// tests/jobs_command.rs
#![cfg(unix)]

mod common;
use crate::common::{ManualExecutor, WAIT, init_tracing, wait_until};

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use regex::Regex;

use batchpool::job::{Job, JobError};
use batchpool::jobs::CommandJob;
use batchpool::types::{JobKind, TaskStatus};

#[test]
fn successful_command_completes() {
    let job = CommandJob::new("ok", "echo hello", JobKind::Encoding);
    job.run().expect("command succeeds");

    let live = job.live_state();
    assert_eq!(live.status, TaskStatus::Completed);
    assert_eq!(live.progress, 100);
    assert_eq!(live.description, "echo hello");
    assert_eq!(job.kind(), JobKind::Encoding);
}

#[test]
fn progress_is_parsed_from_stdout() {
    let job = Arc::new(
        CommandJob::new(
            "enc",
            "echo 'progress 10%'; echo 'progress 45%'; exec sleep 5",
            JobKind::Encoding,
        )
        .with_progress_pattern(Regex::new(r"(\d+)%").expect("valid regex")),
    );

    let runner = {
        let job = Arc::clone(&job);
        thread::spawn(move || job.run())
    };

    assert!(wait_until(WAIT, || job.live_state().progress == 45));
    assert_eq!(job.live_state().status, TaskStatus::Running);

    job.stop();
    let result = runner.join().expect("runner thread");
    assert!(matches!(result, Err(JobError::Stopped)));
}

#[test]
fn stop_returns_even_when_a_background_child_holds_the_output() {
    // The shell's background child inherits stdout and outlives the shell.
    let job = Arc::new(CommandJob::new(
        "detached",
        "sleep 5 & echo started; wait",
        JobKind::Encoding,
    ));

    let runner = {
        let job = Arc::clone(&job);
        thread::spawn(move || job.run())
    };

    assert!(wait_until(WAIT, || job.live_state().status == TaskStatus::Running));
    let stopped_at = Instant::now();
    job.stop();

    assert!(wait_until(Duration::from_secs(2), || runner.is_finished()));
    assert!(stopped_at.elapsed() < Duration::from_secs(2));
    let result = runner.join().expect("runner thread");
    assert!(matches!(result, Err(JobError::Stopped)));
}

#[test]
fn nonzero_exit_reports_code_and_last_stderr_line() {
    let job = CommandJob::new(
        "rip",
        "echo 'reading toc' >&2; echo 'no disc in drive' >&2; exit 3",
        JobKind::CdExtraction,
    );

    let err = job.run().unwrap_err();
    assert_eq!(err.to_string(), "exit code 3: no disc in drive");
    assert_eq!(job.live_state().status, TaskStatus::Error);
}

#[test]
fn nonzero_exit_without_stderr_reports_code_only() {
    let job = CommandJob::new("quiet", "exit 2", JobKind::Unknown);
    let err = job.run().unwrap_err();
    assert_eq!(err.to_string(), "exit code 2");
}

#[test]
fn stop_before_run_never_spawns() {
    let job = CommandJob::new("never", "echo should-not-run", JobKind::Unknown);
    job.stop();
    assert!(matches!(job.run(), Err(JobError::Stopped)));
    assert_eq!(job.live_state().status, TaskStatus::Waiting);
}

#[test]
fn custom_description_replaces_command_text() {
    let job = CommandJob::new("enc", "lame a.wav a.mp3", JobKind::Encoding)
        .with_description("Encoding a.wav");
    assert_eq!(job.live_state().description, "Encoding a.wav");
    assert_eq!(job.live_state().name, "enc");
}

#[test]
fn failed_command_is_recorded_with_description_and_error() {
    init_tracing();
    let (manager, exec) = ManualExecutor::manager();

    let id = manager.submit(CommandJob::new(
        "enc",
        "echo 'bad header' >&2; exit 1",
        JobKind::Encoding,
    )).expect("submitted");

    let info = manager.execute_inline(exec.take(id).expect("dispatched"));
    assert_eq!(info.status, TaskStatus::Error);
    assert_eq!(
        info.description,
        "echo 'bad header' >&2; exit 1\nexit code 1: bad header"
    );
}
