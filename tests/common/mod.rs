#![allow(dead_code)]

pub use batchpool_test_utils::builders;
pub use batchpool_test_utils::{
    EventLog, ManualExecutor, Outcome, ScriptedJob, init_tracing, wait_until,
};

use std::time::Duration;

/// Upper bound for anything that waits on real worker threads.
pub const WAIT: Duration = Duration::from_secs(5);

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(WAIT, f)
        .await
        .expect("Test timed out after 5 seconds")
}
