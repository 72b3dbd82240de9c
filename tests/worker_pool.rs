// tests/worker_pool.rs

mod common;
use crate::common::{EventLog, Outcome, ScriptedJob, WAIT, init_tracing, wait_until};

use batchpool::exec::{MIN_WORKERS, resolve_worker_count};
use batchpool::manager::{TaskManager, TaskManagerConfig};
use batchpool::types::TaskStatus;

fn pool(workers: usize) -> TaskManager {
    let config = TaskManagerConfig {
        worker_count: workers,
        auto_size: false,
    };
    TaskManager::new(&config).expect("worker pool starts")
}

fn all_finished(manager: &TaskManager) -> bool {
    !manager.running_tasks_available()
}

#[test]
fn worker_count_resolution() {
    // Detection wins when auto sizing.
    assert_eq!(resolve_worker_count(true, 2, 8), 8);
    // Failed detection falls back to the configured count.
    assert_eq!(resolve_worker_count(true, 3, 0), 3);
    // Fixed sizing ignores detection.
    assert_eq!(resolve_worker_count(false, 3, 8), 3);
    // Nothing usable: the minimum.
    assert_eq!(resolve_worker_count(true, 0, 0), MIN_WORKERS);
    assert_eq!(resolve_worker_count(false, 0, 16), MIN_WORKERS);
}

#[test]
fn pool_without_detection_or_configuration_starts_two_workers() {
    init_tracing();
    let config = TaskManagerConfig {
        worker_count: 0,
        auto_size: true,
    };
    let manager = TaskManager::with_detected_concurrency(&config, 0).expect("pool starts");
    assert_eq!(manager.worker_count(), 2);
    manager.shutdown();
}

#[test]
fn independent_jobs_all_complete() {
    init_tracing();
    let manager = pool(2);

    for name in ["a", "b", "c"] {
        manager.submit(ScriptedJob::new(name)).expect("submitted");
    }

    assert!(wait_until(WAIT, || all_finished(&manager)));
    let tasks = manager.current_tasks();
    assert_eq!(tasks.len(), 3);
    assert!(tasks.iter().all(|t| t.status == TaskStatus::Completed));
    assert_eq!(manager.rollup_state().percent_complete, 100);

    manager.shutdown();
}

#[test]
fn dependent_starts_only_after_dependency_ended() {
    init_tracing();
    let manager = pool(4);
    let log = EventLog::new();

    let a = manager.submit(ScriptedJob::new("A").logging_to(&log)).expect("submitted");
    let b = manager.submit_after(a, ScriptedJob::new("B").logging_to(&log)).expect("submitted");
    manager.submit_after(b, ScriptedJob::new("C").logging_to(&log)).expect("submitted");

    assert!(wait_until(WAIT, || all_finished(&manager)));

    let end_a = log.position("end:A").expect("A ran");
    let start_b = log.position("start:B").expect("B ran");
    let end_b = log.position("end:B").expect("B ended");
    let start_c = log.position("start:C").expect("C ran");
    assert!(end_a < start_b, "events: {:?}", log.events());
    assert!(end_b < start_c, "events: {:?}", log.events());

    manager.shutdown();
}

#[test]
fn dependent_is_held_while_dependency_runs() {
    init_tracing();
    let manager = pool(2);

    let first = ScriptedJob::new("first").gated().into_shared();
    let a = manager.submit_shared(first.clone(), None).expect("submitted");
    manager.submit_after(a, ScriptedJob::new("second")).expect("submitted");

    assert!(wait_until(WAIT, || manager.current_tasks()[0].status == TaskStatus::Running));
    // A free worker is available, yet the dependent must not start.
    std::thread::sleep(std::time::Duration::from_millis(50));
    assert_eq!(manager.current_tasks()[1].status, TaskStatus::Waiting);

    first.release();
    assert!(wait_until(WAIT, || all_finished(&manager)));
    assert_eq!(manager.current_tasks()[1].status, TaskStatus::Completed);

    manager.shutdown();
}

#[test]
fn panicking_job_does_not_take_down_its_worker() {
    init_tracing();
    let manager = pool(1);

    manager.submit(ScriptedJob::new("boom").outcome(Outcome::Panic("bad frame".into()))).expect("submitted");
    manager.submit(ScriptedJob::new("after")).expect("submitted");

    assert!(wait_until(WAIT, || all_finished(&manager)));
    let tasks = manager.current_tasks();
    assert_eq!(tasks[0].status, TaskStatus::Error);
    assert!(tasks[0].description.contains("Unknown error: bad frame"));
    assert_eq!(tasks[1].status, TaskStatus::Completed);

    manager.shutdown();
}

#[test]
fn busy_flags_follow_running_jobs() {
    init_tracing();
    let manager = pool(2);

    let one = ScriptedJob::new("one").gated().into_shared();
    let two = ScriptedJob::new("two").gated().into_shared();
    manager.submit_shared(one.clone(), None).expect("submitted");
    manager.submit_shared(two.clone(), None).expect("submitted");

    assert!(wait_until(WAIT, || manager.busy_workers() == 2));
    assert!(manager.all_workers_busy());

    one.release();
    assert!(wait_until(WAIT, || manager.busy_workers() == 1));
    assert!(!manager.all_workers_busy());

    two.release();
    assert!(wait_until(WAIT, || all_finished(&manager)));
    assert!(wait_until(WAIT, || manager.busy_workers() == 0));

    manager.shutdown();
}

#[test]
fn shutdown_stops_running_jobs_and_joins_workers() {
    init_tracing();
    let manager = pool(2);

    let blocked = ScriptedJob::new("blocked").gated().into_shared();
    manager.submit_shared(blocked.clone(), None).expect("submitted");
    assert!(wait_until(WAIT, || manager.busy_workers() == 1));

    // Returns only once the blocked job observed its stop and the worker
    // thread was joined.
    manager.shutdown();
    assert!(blocked.was_stopped());
}

#[test]
fn stop_all_on_live_pool_ends_every_job() {
    init_tracing();
    let manager = pool(2);

    let running = ScriptedJob::new("running").gated().into_shared();
    let id = manager.submit_shared(running.clone(), None).expect("submitted");
    manager.submit_after(id, ScriptedJob::new("waiting")).expect("submitted");
    assert!(wait_until(WAIT, || manager.busy_workers() == 1));

    manager.stop_all();
    assert!(!manager.running_tasks_available());
    assert!(running.was_stopped());

    // The worker records the stop once run returns; the dependent stays
    // stopped-while-waiting.
    assert!(wait_until(WAIT, || manager.current_tasks()[0].status == TaskStatus::Error));
    assert_eq!(manager.current_tasks()[1].status, TaskStatus::Waiting);

    // That late record belongs to the stopped batch and finishes nothing.
    assert!(!manager.registry().is_finished(id));
    assert_eq!(manager.dispatch_pending(), 0);

    manager.shutdown();
}
