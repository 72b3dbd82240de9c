// tests/dependency_order_property.rs

mod common;
use crate::common::{ManualExecutor, Outcome, ScriptedJob};

use proptest::prelude::*;

use batchpool::types::{JobId, TaskStatus};

/// A batch of jobs where job `i` may depend on some job `j < i`, plus a
/// failure flag per job.
fn batch() -> impl Strategy<Value = Vec<(Option<usize>, bool)>> {
    (1usize..12).prop_flat_map(|n| {
        (0..n)
            .map(|i| {
                let dep = if i == 0 {
                    Just(None).boxed()
                } else {
                    proptest::option::of(0..i).boxed()
                };
                (dep, any::<bool>())
            })
            .collect::<Vec<_>>()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_job_runs_once_and_after_its_dependency(
        jobs in batch(),
        picks in proptest::collection::vec(any::<prop::sample::Index>(), 32),
    ) {
        let (manager, exec) = ManualExecutor::manager();

        let mut ids: Vec<JobId> = Vec::new();
        let mut deps: Vec<Option<JobId>> = Vec::new();
        for (i, (dep, fails)) in jobs.iter().enumerate() {
            let outcome = if *fails { Outcome::Fail(format!("job {i} failed")) } else { Outcome::Succeed };
            let job = ScriptedJob::new(&format!("job{i}")).outcome(outcome);
            let dep_id = dep.map(|d| ids[d]);
            let id = match dep_id {
                Some(d) => manager.submit_after(d, job).expect("submitted"),
                None => manager.submit(job).expect("submitted"),
            };
            ids.push(id);
            deps.push(dep_id);
        }

        // Run dispatched jobs in an arbitrary order chosen by `picks`.
        let mut executed: Vec<JobId> = Vec::new();
        let mut round = 0;
        loop {
            let pending = exec.pending_ids();
            if pending.is_empty() {
                break;
            }
            let pick = picks[round % picks.len()].index(pending.len());
            round += 1;

            let ready = exec.take(pending[pick]).expect("pending job is takeable");
            executed.push(ready.id);
            manager.execute_inline(ready);
        }

        // Each job executed exactly once.
        prop_assert_eq!(executed.len(), ids.len());
        let mut sorted = executed.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), ids.len());

        // No job ran before its dependency had finished.
        for (i, id) in ids.iter().enumerate() {
            if let Some(dep) = deps[i] {
                let pos_dep = executed.iter().position(|e| *e == dep).expect("dep executed");
                let pos_job = executed.iter().position(|e| e == id).expect("job executed");
                prop_assert!(pos_dep < pos_job);
            }
        }

        // Every job has a terminal snapshot matching its scripted outcome.
        prop_assert!(!manager.running_tasks_available());
        for (task, (_, fails)) in manager.current_tasks().iter().zip(jobs.iter()) {
            let expected = if *fails { TaskStatus::Error } else { TaskStatus::Completed };
            prop_assert_eq!(task.status, expected);
        }
    }
}
