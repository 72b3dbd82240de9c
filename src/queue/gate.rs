// src/queue/gate.rs

//! Dependency gate: decides whether a job may start now.

use std::collections::HashSet;

use crate::types::JobId;

/// A job without a dependency is always eligible; otherwise its dependency
/// must be in the finished-identity set.
///
/// This is a pure membership test. A dependency that ended in error still
/// unblocks its dependents.
pub fn is_eligible(dependency: Option<JobId>, finished: &HashSet<JobId>) -> bool {
    match dependency {
        None => true,
        Some(dep) => finished.contains(&dep),
    }
}
