//! Detection over date-partitioned JSONL transcripts.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use serde_json::Value;
use tracing::{debug, trace};

use super::{is_assistant_entry, mentions, recent_files, CompletionDetector, PendingRequest};

/// Transcripts laid out as `<root>/YYYY/MM/DD/<session>.jsonl`.
///
/// Today's and yesterday's directories are scanned so a request sent just
/// before midnight is still found.
#[derive(Debug, Clone)]
pub struct DatedTranscriptDetector {
    root: PathBuf,
}

impl DatedTranscriptDetector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory for one calendar day.
    pub fn day_dir(&self, date: NaiveDate) -> PathBuf {
        self.root
            .join(date.format("%Y").to_string())
            .join(date.format("%m").to_string())
            .join(date.format("%d").to_string())
    }

    fn candidate_dirs(&self) -> Vec<PathBuf> {
        let today = Local::now().date_naive();
        vec![self.day_dir(today), self.day_dir(today - ChronoDuration::days(1))]
    }

    /// Most recently modified transcript written since the request started.
    fn newest_transcript(&self, request: &PendingRequest) -> Option<PathBuf> {
        self.candidate_dirs()
            .iter()
            .filter_map(|dir| {
                let newest = recent_files(dir, "jsonl", request.started_at).into_iter().next()?;
                let modified = fs::metadata(&newest).ok()?.modified().ok()?;
                Some((modified, newest))
            })
            .max_by_key(|(modified, _)| *modified)
            .map(|(_, path)| path)
    }
}

/// Scans a JSONL transcript from the end for an assistant entry holding `ack`.
pub(crate) fn transcript_has_ack(path: &Path, ack: &str) -> bool {
    let Ok(content) = fs::read_to_string(path) else {
        return false;
    };
    content
        .lines()
        .rev()
        .filter(|line| line.contains(ack))
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .any(|entry| is_assistant_entry(&entry) && mentions(&entry, ack))
}

impl CompletionDetector for DatedTranscriptDetector {
    fn is_complete(&self, request: &PendingRequest) -> bool {
        let Some(path) = self.newest_transcript(request) else {
            trace!(root = %self.root.display(), "no transcript since request");
            return false;
        };
        let found = transcript_has_ack(&path, request.ack());
        if found {
            debug!(transcript = %path.display(), "acknowledgment found in transcript");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gumploop_models::TokenPair;
    use std::time::{Duration, SystemTime};

    fn write_today(detector: &DatedTranscriptDetector, name: &str, lines: &[String]) -> PathBuf {
        let dir = detector.day_dir(Local::now().date_naive());
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    #[test]
    fn test_day_dir_layout() {
        let detector = DatedTranscriptDetector::new("/t");
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(detector.day_dir(date), PathBuf::from("/t/2025/03/07"));
    }

    #[test]
    fn test_user_echo_does_not_complete() {
        let root = tempfile::tempdir().unwrap();
        let detector = DatedTranscriptDetector::new(root.path());
        let mut request = PendingRequest::new(TokenPair::generate());
        request.started_at = SystemTime::now() - Duration::from_secs(5);
        let ack = request.ack().to_string();

        let user = serde_json::json!({"type": "user", "message": {"role": "user", "content": format!("end with {}", ack)}});
        write_today(&detector, "s.jsonl", &[user.to_string()]);
        assert!(!detector.is_complete(&request));
    }

    #[test]
    fn test_assistant_ack_completes() {
        let root = tempfile::tempdir().unwrap();
        let detector = DatedTranscriptDetector::new(root.path());
        let mut request = PendingRequest::new(TokenPair::generate());
        request.started_at = SystemTime::now() - Duration::from_secs(5);
        let ack = request.ack().to_string();

        let user = serde_json::json!({"message": {"role": "user", "content": ack.clone()}});
        let reply = serde_json::json!({"message": {"role": "assistant", "content": [{"type": "text", "text": format!("Plan written.\n{}", ack)}]}});
        write_today(
            &detector,
            "s.jsonl",
            &[user.to_string(), "not json".to_string(), reply.to_string()],
        );
        assert!(detector.is_complete(&request));
    }

    #[test]
    fn test_transcripts_before_request_are_ignored() {
        let root = tempfile::tempdir().unwrap();
        let detector = DatedTranscriptDetector::new(root.path());
        let mut request = PendingRequest::new(TokenPair::generate());
        let reply = serde_json::json!({"role": "assistant", "content": request.ack()});
        write_today(&detector, "old.jsonl", &[reply.to_string()]);

        request.started_at = SystemTime::now() + Duration::from_secs(60);
        assert!(!detector.is_complete(&request));
    }
}
