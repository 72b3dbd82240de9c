// src/exec/mod.rs

//! Job execution layer.
//!
//! - [`dispatcher`] moves eligible jobs from the registry onto an executor.
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `ChannelBackend` that feeds the worker pool in production; tests can
//!   replace it with a manual implementation.
//! - [`worker`] is the per-job worker body (run, catch, record, re-scan).
//! - [`pool`] owns the long-lived worker threads and pool sizing.

pub mod backend;
pub mod dispatcher;
pub mod pool;
pub mod worker;

pub use backend::{ChannelBackend, ExecutorBackend};
pub use dispatcher::Dispatcher;
pub use pool::{MIN_WORKERS, WorkerPool, detect_hardware_concurrency, resolve_worker_count};
pub use worker::{BusyFlags, UNKNOWN_ERROR_TEXT, run_job};
