// src/engine/mod.rs

//! Presentation side of the binary.
//!
//! The scheduling core never pushes notifications; the [`monitor`] polls it
//! on a fixed interval, logs status changes and turns Ctrl-C into
//! `stop_all`.

pub mod monitor;

pub use monitor::{Monitor, RunSummary};
