//! Completion detection.
//!
//! The primary signal is the acknowledgment token showing up in an
//! assistant-authored entry of the agent's own transcript, written after
//! the request was sent. Terminal snapshots only serve as a fallback.

mod chat_log;
mod dated;
mod json;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use gumploop_models::TokenPair;

pub use chat_log::ChatLogDetector;
pub use dated::DatedTranscriptDetector;
pub use json::{is_assistant_entry, mentions};

/// The message currently awaiting an answer.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub tokens: TokenPair,
    /// Signals older than this are ignored.
    pub started_at: SystemTime,
}

impl PendingRequest {
    /// Starts tracking `tokens` from now.
    pub fn new(tokens: TokenPair) -> Self {
        Self {
            tokens,
            started_at: SystemTime::now(),
        }
    }

    /// The acknowledgment token as text.
    pub fn ack(&self) -> &str {
        self.tokens.ack.as_str()
    }
}

/// Looks for the acknowledgment of a pending request.
pub trait CompletionDetector: Send + Sync {
    /// Returns true once the request has been answered.
    fn is_complete(&self, request: &PendingRequest) -> bool;
}

/// Files directly in `dir` with the given extension, modified at or after
/// `since`, newest first.
pub(crate) fn recent_files(dir: &Path, extension: &str, since: SystemTime) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let path = e.path();
            if path.extension().and_then(|x| x.to_str()) != Some(extension) {
                return None;
            }
            let modified = e.metadata().ok()?.modified().ok()?;
            (modified >= since).then_some((modified, path))
        })
        .collect();
    files.sort_by(|a, b| b.0.cmp(&a.0));
    files.into_iter().map(|(_, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_recent_files_filters_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jsonl"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        fs::write(dir.path().join("b.jsonl"), "{}").unwrap();

        let files = recent_files(dir.path(), "jsonl", SystemTime::UNIX_EPOCH);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a.jsonl"));

        let future = SystemTime::now() + Duration::from_secs(3600);
        assert!(recent_files(dir.path(), "jsonl", future).is_empty());
    }

    #[test]
    fn test_recent_files_missing_dir() {
        assert!(recent_files(Path::new("/nonexistent/gumploop"), "json", SystemTime::UNIX_EPOCH)
            .is_empty());
    }
}
