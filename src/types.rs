use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Identity of a job, assigned by the registry at submission time.
///
/// Identities start at 1 and are never reused for the lifetime of the
/// process that owns the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u32);

impl JobId {
    pub const fn new(raw: u32) -> Self {
        JobId(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of work a job performs.
///
/// Every job carries its kind explicitly; callers query it instead of
/// inspecting the concrete job type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Encoding,
    CdExtraction,
    PlaylistWrite,
    #[default]
    Unknown,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobKind::Encoding => "encoding",
            JobKind::CdExtraction => "cd_extraction",
            JobKind::PlaylistWrite => "playlist_write",
            JobKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "encoding" | "encode" => Ok(JobKind::Encoding),
            "cd_extraction" | "cd" => Ok(JobKind::CdExtraction),
            "playlist_write" | "playlist" => Ok(JobKind::PlaylistWrite),
            "unknown" => Ok(JobKind::Unknown),
            other => Err(format!(
                "invalid job kind: {other} (expected \"encoding\", \"cd_extraction\", \"playlist_write\" or \"unknown\")"
            )),
        }
    }
}

/// Execution status of a job as seen in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Submitted, not yet running (possibly blocked on its dependency).
    Waiting,
    Running,
    Completed,
    Error,
}

impl TaskStatus {
    pub fn is_active(self) -> bool {
        matches!(self, TaskStatus::Waiting | TaskStatus::Running)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Waiting => "Waiting",
            TaskStatus::Running => "Running",
            TaskStatus::Completed => "Completed",
            TaskStatus::Error => "Error",
        };
        f.write_str(s)
    }
}
