// src/queue/mod.rs

//! Job bookkeeping for the scheduling core.
//!
//! - [`registry`] owns the ordered job queue, the terminal-snapshot table and
//!   the finished-identity set, all behind one lock.
//! - [`gate`] is the pure "may this job start now?" decision.
//! - [`recorder`] turns a job's last live state into its terminal snapshot.
//! - [`rollup`] holds the read-only aggregate queries.

pub mod gate;
pub mod recorder;
pub mod registry;
pub mod rollup;

pub use registry::{JobRegistry, ReadyJob};
pub use rollup::RollupState;
