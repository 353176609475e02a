//! Timing and location settings for agent sessions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gumploop_core::config::agent_binary;
use gumploop_models::AgentKind;

use crate::poll::TimeoutPolicy;

/// Default delay before the first readiness check after launch.
pub const DEFAULT_STARTUP_GRACE: Duration = Duration::from_secs(2);
/// Default readiness poll cadence.
pub const DEFAULT_READY_POLL: Duration = Duration::from_millis(500);
/// Default readiness ceiling; startup proceeds anyway once it passes.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);
/// Default completion/progress poll cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Initial deadline for any single wait.
pub const BASE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// Amount the deadline moves forward while the agent stays active.
pub const EXTENSION: Duration = Duration::from_secs(15 * 60);
/// Maximum age of the last observed activity for an extension to apply.
pub const ACTIVITY_THRESHOLD: Duration = Duration::from_secs(60);
/// Settle time before trusting an idle-looking screen.
pub const DEFAULT_STABILIZATION: Duration = Duration::from_secs(3);
/// Number of trailing non-blank lines inspected by snapshot detection.
pub const DEFAULT_SNAPSHOT_TAIL: usize = 20;

/// Program and arguments used to start one agent CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchSpec {
    /// Non-interactive launch for the agent kind.
    ///
    /// The binary can be overridden with `GUMPLOOP_<AGENT>_BIN`.
    pub fn for_kind(kind: AgentKind) -> Self {
        let name = kind.agent_name();
        let flag = match kind {
            AgentKind::Implementer => "--dangerously-skip-permissions",
            AgentKind::UxReviewer => "--yolo",
            AgentKind::TechReviewer => "--dangerously-bypass-approvals-and-sandbox",
        };
        Self {
            program: agent_binary(name, name),
            args: vec![flag.to_string()],
        }
    }
}

/// Where each agent writes its conversation transcripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRoots {
    /// Dated JSONL layout (`<root>/YYYY/MM/DD/*.jsonl`).
    pub implementer: PathBuf,
    /// Per-project chat logs (`<root>/<hash>/chats/*.json`).
    pub ux_reviewer: PathBuf,
    /// Dated JSONL layout (`<root>/YYYY/MM/DD/*.jsonl`).
    pub tech_reviewer: PathBuf,
}

impl TranscriptRoots {
    /// Conventional locations under the home directory.
    pub fn from_home() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::under(&home)
    }

    /// Conventional locations under `home`.
    pub fn under(home: &Path) -> Self {
        Self {
            implementer: home.join(".claude").join("transcripts"),
            ux_reviewer: home.join(".gemini").join("tmp"),
            tech_reviewer: home.join(".codex").join("sessions"),
        }
    }

    /// Root for the given agent kind.
    pub fn for_kind(&self, kind: AgentKind) -> &Path {
        match kind {
            AgentKind::Implementer => &self.implementer,
            AgentKind::UxReviewer => &self.ux_reviewer,
            AgentKind::TechReviewer => &self.tech_reviewer,
        }
    }
}

/// Settings shared by every agent session.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub startup_grace: Duration,
    pub ready_poll_interval: Duration,
    pub ready_timeout: Duration,
    pub poll_interval: Duration,
    pub base_timeout: Duration,
    pub extension: Duration,
    pub activity_threshold: Duration,
    pub stabilization: Duration,
    pub snapshot_tail: usize,
    pub transcripts: TranscriptRoots,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            startup_grace: DEFAULT_STARTUP_GRACE,
            ready_poll_interval: DEFAULT_READY_POLL,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            base_timeout: BASE_TIMEOUT,
            extension: EXTENSION,
            activity_threshold: ACTIVITY_THRESHOLD,
            stabilization: DEFAULT_STABILIZATION,
            snapshot_tail: DEFAULT_SNAPSHOT_TAIL,
            transcripts: TranscriptRoots::from_home(),
        }
    }
}

impl AgentConfig {
    /// Set the transcript locations.
    pub fn with_transcripts(mut self, transcripts: TranscriptRoots) -> Self {
        self.transcripts = transcripts;
        self
    }

    /// Set the completion/progress poll cadence.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the startup grace and readiness ceiling.
    pub fn with_startup(mut self, grace: Duration, ready_timeout: Duration) -> Self {
        self.startup_grace = grace;
        self.ready_timeout = ready_timeout;
        self
    }

    /// Set the base deadline and extension step.
    pub fn with_timeouts(mut self, base: Duration, extension: Duration) -> Self {
        self.base_timeout = base;
        self.extension = extension;
        self
    }

    /// Policy for the adaptive wait loop.
    pub fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy {
            base: self.base_timeout,
            extension: self.extension,
            activity_threshold: self.activity_threshold,
            interval: self.poll_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.base_timeout, Duration::from_secs(1800));
        assert_eq!(config.extension, Duration::from_secs(900));
        assert_eq!(config.activity_threshold, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.snapshot_tail, 20);
    }

    #[test]
    fn test_builder() {
        let config = AgentConfig::default()
            .with_poll_interval(Duration::from_millis(10))
            .with_timeouts(Duration::from_secs(1), Duration::from_millis(500));
        let policy = config.timeout_policy();
        assert_eq!(policy.interval, Duration::from_millis(10));
        assert_eq!(policy.base, Duration::from_secs(1));
        assert_eq!(policy.extension, Duration::from_millis(500));
    }

    #[test]
    fn test_transcript_roots_under_home() {
        let roots = TranscriptRoots::under(Path::new("/home/dev"));
        assert_eq!(
            roots.for_kind(AgentKind::Implementer),
            Path::new("/home/dev/.claude/transcripts")
        );
        assert_eq!(
            roots.for_kind(AgentKind::UxReviewer),
            Path::new("/home/dev/.gemini/tmp")
        );
        assert_eq!(
            roots.for_kind(AgentKind::TechReviewer),
            Path::new("/home/dev/.codex/sessions")
        );
    }

    #[test]
    fn test_launch_flags() {
        let spec = LaunchSpec::for_kind(AgentKind::UxReviewer);
        assert_eq!(spec.args, vec!["--yolo".to_string()]);
        let spec = LaunchSpec::for_kind(AgentKind::TechReviewer);
        assert_eq!(spec.args, vec!["--dangerously-bypass-approvals-and-sandbox".to_string()]);
    }
}
