// src/jobs/playlist.rs

//! Playlist writer job.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::job::{Job, JobError, LiveState};
use crate::types::{JobKind, TaskStatus};

/// One line of a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaylistEntry {
    /// File name written into the playlist, as given.
    pub path: String,

    /// Title for `#EXTINF`; defaults to the path.
    #[serde(default)]
    pub title: Option<String>,

    /// Track length for `#EXTINF`.
    #[serde(default)]
    pub length_secs: u32,
}

impl PlaylistEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: None,
            length_secs: 0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>, length_secs: u32) -> Self {
        self.title = Some(title.into());
        self.length_secs = length_secs;
        self
    }
}

/// Writes an M3U playlist, usually after the jobs producing its files.
///
/// Extended playlists carry `#EXTM3U` and an `#EXTINF` line per entry.
#[derive(Debug)]
pub struct PlaylistJob {
    output: PathBuf,
    extended: bool,
    entries: Vec<PlaylistEntry>,
    finished: AtomicBool,
    error_text: Mutex<Option<String>>,
}

impl PlaylistJob {
    pub fn new(output: impl Into<PathBuf>, extended: bool, entries: Vec<PlaylistEntry>) -> Self {
        Self {
            output: output.into(),
            extended,
            entries,
            finished: AtomicBool::new(false),
            error_text: Mutex::new(None),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    fn write_entries(&self, out: &mut impl Write) -> std::io::Result<()> {
        if self.extended {
            write!(out, "#EXTM3U\n\n")?;
        }

        for entry in &self.entries {
            if self.extended {
                let title = entry.title.as_deref().unwrap_or(&entry.path);
                writeln!(out, "#EXTINF:{},{}", entry.length_secs, title)?;
            }

            writeln!(out, "{}", entry.path)?;

            if self.extended {
                writeln!(out)?;
            }
        }

        out.flush()
    }
}

impl Job for PlaylistJob {
    fn kind(&self) -> JobKind {
        JobKind::PlaylistWrite
    }

    fn run(&self) -> Result<(), JobError> {
        self.finished.store(false, Ordering::SeqCst);

        let file = match File::create(&self.output) {
            Ok(f) => f,
            Err(e) => {
                warn!(output = %self.output.display(), error = %e, "could not create playlist file");
                *self.error_text.lock() = Some(format!(
                    "could not create playlist file {}: {e}",
                    self.output.display()
                ));
                return Ok(());
            }
        };

        let mut out = BufWriter::new(file);
        self.write_entries(&mut out)?;

        info!(
            output = %self.output.display(),
            entries = self.entries.len(),
            extended = self.extended,
            "playlist written"
        );
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {}

    fn live_state(&self) -> LiveState {
        let file_name = self
            .output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.output.display().to_string());

        let finished = self.finished.load(Ordering::SeqCst);
        let (status, progress) = if finished {
            (TaskStatus::Completed, 100)
        } else {
            (TaskStatus::Waiting, 0)
        };

        LiveState::new(format!("Playlist: {file_name}"), status, progress)
    }

    fn error_text(&self) -> Option<String> {
        self.error_text.lock().clone()
    }
}
