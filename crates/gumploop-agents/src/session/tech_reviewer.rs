use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use gumploop_core::text::{strip_ansi, tail_lines};
use gumploop_models::{AgentKind, SessionId, TokenPair};

use crate::config::LaunchSpec;
use crate::detect::{CompletionDetector, DatedTranscriptDetector};
use crate::error::Result;
use crate::patterns::ScreenState;

use super::{AgentSession, SessionCore, SessionEnv};

/// Returns true if a re-captured screen confirms an earlier idle reading.
fn confirms_idle(first: &str, second: &str, tail: usize) -> bool {
    if ScreenState::classify(second, tail) != ScreenState::Idle {
        return false;
    }
    let (a, b) = (strip_ansi(first), strip_ansi(second));
    tail_lines(&a, tail) == tail_lines(&b, tail)
}

/// Screen-based completion inference for one request.
///
/// An idle screen only counts once the agent was seen busy since the
/// request went out.
#[derive(Debug)]
struct IdleFallback {
    tail: usize,
    saw_busy: bool,
}

impl IdleFallback {
    fn new(tail: usize) -> Self {
        Self {
            tail,
            saw_busy: false,
        }
    }

    /// Feeds one capture. Returns it when it is an idle candidate.
    fn observe(&mut self, screen: &str) -> Option<String> {
        let state = ScreenState::classify(screen, self.tail);
        self.saw_busy |= state == ScreenState::Busy;
        (self.saw_busy && state == ScreenState::Idle).then(|| screen.to_string())
    }
}

/// Waits `settle`, re-captures and checks the screen did not move.
async fn settles_idle<F>(first: String, settle: Duration, tail: usize, recapture: F) -> bool
where
    F: FnOnce() -> Option<String>,
{
    tokio::time::sleep(settle).await;
    recapture().is_some_and(|second| confirms_idle(&first, &second, tail))
}

/// The technical reviewer CLI.
///
/// Completion comes from its dated JSONL transcripts. When those never
/// show the token, an idle prompt on screen (after the agent was seen
/// busy, and still idle after a settle delay) is accepted instead.
#[derive(Debug)]
pub struct TechReviewerSession {
    core: SessionCore,
    detector: DatedTranscriptDetector,
}

impl TechReviewerSession {
    pub fn new(work_dir: impl Into<PathBuf>, env: SessionEnv) -> Self {
        let detector = DatedTranscriptDetector::new(env.config.transcripts.tech_reviewer.clone());
        Self {
            core: SessionCore::new(AgentKind::TechReviewer, work_dir.into(), env),
            detector,
        }
    }
}

#[async_trait]
impl AgentSession for TechReviewerSession {
    fn id(&self) -> &SessionId {
        self.core.id()
    }

    fn kind(&self) -> AgentKind {
        AgentKind::TechReviewer
    }

    async fn start(&mut self) -> Result<()> {
        self.core.start(&LaunchSpec::for_kind(AgentKind::TechReviewer)).await
    }

    async fn send_message(&mut self, text: &str) -> Result<TokenPair> {
        self.core.send(text).await
    }

    async fn wait_for_completion(&mut self) -> Result<()> {
        let request = self.core.pending()?;
        let detector = &self.detector;
        let tail = self.core.config().snapshot_tail;
        let settle = self.core.config().stabilization;
        let tmux = self.core.tmux().clone();
        let session = self.core.id().to_string();
        let mut fallback = IdleFallback::new(tail);

        self.core
            .await_signal("completion", |screen| {
                let confirmed = detector.is_complete(&request);
                let candidate = fallback.observe(screen).filter(|_| !confirmed);
                let tmux = tmux.clone();
                let session = session.clone();
                async move {
                    if confirmed {
                        return true;
                    }
                    let Some(first) = candidate else {
                        return false;
                    };
                    let settled =
                        settles_idle(first, settle, tail, || tmux.capture_output(&session, None).ok())
                            .await;
                    if settled {
                        debug!(session = %session, "completion inferred from idle screen");
                    }
                    settled
                }
            })
            .await?;
        self.core.finish_request();
        Ok(())
    }

    async fn wait_for_progress_event(
        &mut self,
        agent: &str,
        action: &str,
        iteration: u32,
    ) -> Result<()> {
        self.core.wait_for_progress(agent, action, iteration).await
    }

    async fn stop(&mut self) {
        self.core.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirms_idle_requires_same_tail() {
        let idle = "review done\nAPPROVED\n›\n";
        assert!(confirms_idle(idle, idle, 20));
        assert!(!confirms_idle(idle, "review done\nAPPROVED\nmore\n›\n", 20));
    }

    #[test]
    fn test_confirms_idle_rejects_busy_recheck() {
        let idle = "›\n";
        assert!(!confirms_idle(idle, "• Working (3s • esc to interrupt)\n›\n", 20));
    }

    const BUSY: &str = "• Working (12s • esc to interrupt)\n";
    const IDLE: &str = "Ran the suite.\nTESTS_PASSED\n\n›\n";
    const SETTLE: Duration = Duration::from_secs(3);

    #[test]
    fn test_idle_before_busy_is_not_a_candidate() {
        let mut fallback = IdleFallback::new(20);
        assert!(fallback.observe(IDLE).is_none());
        assert!(fallback.observe("loading\n").is_none());
        assert!(fallback.observe(BUSY).is_none());
        assert_eq!(fallback.observe(IDLE).as_deref(), Some(IDLE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_candidate_confirmed_after_settle() {
        let mut fallback = IdleFallback::new(20);
        fallback.observe(BUSY);
        let first = fallback.observe(IDLE).unwrap();

        let start = tokio::time::Instant::now();
        assert!(settles_idle(first, SETTLE, 20, || Some(IDLE.to_string())).await);
        assert!(start.elapsed() >= SETTLE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_candidate_rejected_when_screen_moves() {
        let mut fallback = IdleFallback::new(20);
        fallback.observe(BUSY);
        let first = fallback.observe(IDLE).unwrap();

        assert!(!settles_idle(first.clone(), SETTLE, 20, || Some(BUSY.to_string())).await);
        let moved = format!("{}one more line\n›\n", IDLE);
        assert!(!settles_idle(first.clone(), SETTLE, 20, || Some(moved)).await);
        assert!(!settles_idle(first, SETTLE, 20, || None).await);
    }
}
