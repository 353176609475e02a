//! Detection over per-project chat logs.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use super::{is_assistant_entry, mentions, recent_files, CompletionDetector, PendingRequest};

const CHATS_SUBDIR: &str = "chats";

/// Hex SHA-256 of the working directory path, as used for the log folder.
pub fn project_hash(work_dir: &Path) -> String {
    let digest = Sha256::digest(work_dir.to_string_lossy().as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Chat logs laid out as `<root>/<project-hash>/chats/*.json`.
///
/// The folder for the hashed working directory is searched first; every
/// other project folder follows, since the CLI may resolve the path
/// differently (symlinks, trailing slashes).
#[derive(Debug, Clone)]
pub struct ChatLogDetector {
    root: PathBuf,
    work_dir: PathBuf,
}

impl ChatLogDetector {
    pub fn new(root: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            work_dir: work_dir.into(),
        }
    }

    fn chat_dirs(&self) -> Vec<PathBuf> {
        let preferred = self.root.join(project_hash(&self.work_dir));
        let mut dirs = vec![preferred.join(CHATS_SUBDIR)];
        if let Ok(entries) = fs::read_dir(&self.root) {
            let mut others: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_dir() && *p != preferred)
                .map(|p| p.join(CHATS_SUBDIR))
                .collect();
            others.sort();
            dirs.extend(others);
        }
        dirs
    }
}

/// Returns true if a chat file holds an agent message containing `ack`.
pub(crate) fn chat_has_ack(path: &Path, ack: &str) -> bool {
    let Ok(content) = fs::read_to_string(path) else {
        return false;
    };
    if !content.contains(ack) {
        return false;
    }
    let Ok(doc) = serde_json::from_str::<Value>(&content) else {
        return false;
    };
    let messages = match &doc {
        Value::Array(items) => items.as_slice(),
        other => match other.get("messages").and_then(Value::as_array) {
            Some(items) => items.as_slice(),
            None => return false,
        },
    };
    messages
        .iter()
        .rev()
        .any(|m| is_assistant_entry(m) && mentions(m, ack))
}

impl CompletionDetector for ChatLogDetector {
    fn is_complete(&self, request: &PendingRequest) -> bool {
        for dir in self.chat_dirs() {
            for file in recent_files(&dir, "json", request.started_at) {
                if chat_has_ack(&file, request.ack()) {
                    debug!(chat = %file.display(), "acknowledgment found in chat log");
                    return true;
                }
            }
        }
        trace!(root = %self.root.display(), "no acknowledgment in chat logs");
        false
    }
}
