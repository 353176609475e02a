//! Read side of the per-project progress event log.
//!
//! External agents append one JSON line per finished sub-task; this side
//! only ever reads the file (and truncates it between phase runs).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{trace, warn};

use gumploop_core::config::project_dir;
use gumploop_models::ProgressEvent;

use crate::atomic::ensure_dir;
use crate::error::{PersistenceError, Result};

const PROGRESS_FILE: &str = "progress.jsonl";

/// Tolerant reader for `progress.jsonl`.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    /// Creates a reader for an explicit log path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a reader for the project's log.
    pub fn for_project(work_dir: &Path) -> Self {
        Self::new(project_dir(work_dir).join(PROGRESS_FILE))
    }

    /// Returns the log path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every well-formed event in the log.
    ///
    /// A missing file is an empty log. Blank and unparsable lines (for
    /// example a line another process is still writing, possibly cut in
    /// the middle of a multi-byte character) are skipped.
    pub fn read_events(&self) -> Vec<ProgressEvent> {
        let bytes = match fs::read(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read progress log");
                return Vec::new();
            }
        };

        let content = String::from_utf8_lossy(&bytes);
        let events = ProgressEvent::parse_log(&content);
        trace!(path = %self.path.display(), count = events.len(), "read progress events");
        events
    }

    /// Returns true if the log holds the (agent, action, iteration) tuple.
    pub fn contains(&self, agent: &str, action: &str, iteration: u32) -> bool {
        self.read_events()
            .iter()
            .any(|e| e.matches(agent, action, iteration))
    }

    /// Empties the log at the start of a phase run.
    pub fn purge(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        fs::write(&self.path, b"").map_err(|source| PersistenceError::WriteError {
            path: self.path.clone(),
            source,
        })
    }
}
