//! Locations and read-back of agent-written artifacts.
//!
//! Artifacts are plain text written by the agents at paths dictated in
//! their prompts. They are only read back to look for approval markers.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use gumploop_core::config::project_dir;

use crate::atomic::ensure_dir;
use crate::error::Result;

/// Artifacts shorter than this are treated as not yet written.
pub const MIN_ARTIFACT_LEN: usize = 50;

/// Outcome of reading an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactRead {
    /// File does not exist or cannot be read.
    Missing,
    /// File exists but holds fewer than [`MIN_ARTIFACT_LEN`] bytes.
    TooShort(String),
    /// File content.
    Ready(String),
}

impl ArtifactRead {
    /// Reads an artifact from disk.
    pub fn from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) if content.trim().len() < MIN_ARTIFACT_LEN => {
                debug!(path = %path.display(), len = content.len(), "artifact too short");
                ArtifactRead::TooShort(content)
            }
            Ok(content) => ArtifactRead::Ready(content),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "artifact missing");
                ArtifactRead::Missing
            }
        }
    }

    /// Returns the content if the artifact is usable.
    pub fn ready(&self) -> Option<&str> {
        match self {
            ArtifactRead::Ready(content) => Some(content),
            _ => None,
        }
    }
}

/// File layout of `<project>/.gumploop/`.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    work_dir: PathBuf,
    root: PathBuf,
}

impl ProjectLayout {
    /// Creates the layout for a project directory.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let root = project_dir(&work_dir);
        Self { work_dir, root }
    }

    /// The project directory the agents work in.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// The `.gumploop` directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the `.gumploop` directory.
    pub fn ensure(&self) -> Result<()> {
        ensure_dir(&self.root)
    }

    pub fn plan(&self) -> PathBuf {
        self.root.join("plan.md")
    }

    /// Review of the plan written by one reviewer persona.
    pub fn review(&self, agent: &str) -> PathBuf {
        self.root.join(format!("review-{}.md", agent))
    }

    pub fn code_review(&self) -> PathBuf {
        self.root.join("code-review.md")
    }

    pub fn test_results(&self) -> PathBuf {
        self.root.join("test-results.md")
    }

    pub fn bug_analysis(&self) -> PathBuf {
        self.root.join("bug-analysis.md")
    }

    /// Individual research notes of one persona.
    pub fn research(&self, agent: &str) -> PathBuf {
        self.root.join(format!("research-{}.md", agent))
    }

    /// Synthesized research report.
    pub fn research_summary(&self) -> PathBuf {
        self.root.join("research.md")
    }

    /// Individual discovery notes of one persona.
    pub fn discovery(&self, agent: &str) -> PathBuf {
        self.root.join(format!("discovery-{}.md", agent))
    }

    /// Synthesized discovery report.
    pub fn discovery_summary(&self) -> PathBuf {
        self.root.join("discovery-summary.md")
    }

    /// Verdict of one reviewer on a synthesized report.
    pub fn consensus(&self, agent: &str) -> PathBuf {
        self.root.join(format!("consensus-{}.md", agent))
    }

    /// Removes a stale artifact so a new iteration cannot read an old verdict.
    pub fn clear(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %e, "failed to clear artifact");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout_paths() {
        let layout = ProjectLayout::new("/work/app");
        assert_eq!(layout.plan(), PathBuf::from("/work/app/.gumploop/plan.md"));
        assert_eq!(
            layout.review("gemini"),
            PathBuf::from("/work/app/.gumploop/review-gemini.md")
        );
        assert_eq!(
            layout.consensus("codex"),
            PathBuf::from("/work/app/.gumploop/consensus-codex.md")
        );
    }

    #[test]
    fn test_read_artifact_states() {
        let dir = tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        layout.ensure().unwrap();

        assert_eq!(ArtifactRead::from_path(&layout.plan()), ArtifactRead::Missing);

        fs::write(layout.plan(), "# Plan\nTBD").unwrap();
        assert!(matches!(
            ArtifactRead::from_path(&layout.plan()),
            ArtifactRead::TooShort(_)
        ));

        let body = "# Plan\n".to_string() + &"step ".repeat(20);
        fs::write(layout.plan(), &body).unwrap();
        assert_eq!(ArtifactRead::from_path(&layout.plan()).ready(), Some(body.as_str()));
    }

    #[test]
    fn test_clear_missing_is_silent() {
        let dir = tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        layout.clear(&layout.code_review());
        fs::create_dir_all(layout.root()).unwrap();
        fs::write(layout.code_review(), "old verdict").unwrap();
        layout.clear(&layout.code_review());
        assert!(!layout.code_review().exists());
    }
}
