// src/queue/recorder.rs

//! Completion recorder: turns a job's last live snapshot into its terminal
//! snapshot.

use crate::job::TaskInfo;
use crate::types::TaskStatus;

/// Apply the terminal-snapshot rules to `info`.
///
/// - Any non-empty error text forces `Error`, caps progress at 100 and is
///   appended to the description on its own line.
/// - A `Completed` snapshot always reports 100.
pub fn finalize_snapshot(mut info: TaskInfo, error_text: Option<&str>) -> TaskInfo {
    if let Some(text) = error_text.filter(|t| !t.is_empty()) {
        info.status = TaskStatus::Error;
        info.progress = info.progress.min(100);

        let description = format!("{}\n{}", info.description, text);
        info.description = description.trim_start().to_string();
    }

    if info.status == TaskStatus::Completed {
        info.progress = 100;
    }

    info
}

/// Pick the error text to record: the caller's override wins, otherwise the
/// job's own accumulated text.
pub fn effective_error_text(
    override_text: Option<String>,
    accumulated: impl FnOnce() -> Option<String>,
) -> Option<String> {
    match override_text {
        Some(text) if !text.is_empty() => Some(text),
        _ => accumulated().filter(|t| !t.is_empty()),
    }
}
