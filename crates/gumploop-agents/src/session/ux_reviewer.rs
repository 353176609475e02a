use std::future::ready;
use std::path::PathBuf;

use async_trait::async_trait;

use gumploop_models::{AgentKind, SessionId, TokenPair};

use crate::config::LaunchSpec;
use crate::detect::{ChatLogDetector, CompletionDetector};
use crate::error::Result;

use super::{AgentSession, SessionCore, SessionEnv};

/// The UX reviewer CLI, confirmed through its per-project chat logs.
///
/// Outgoing text is neutralized before pasting since this CLI treats
/// leading `/`, `!` and any `@` as commands.
#[derive(Debug)]
pub struct UxReviewerSession {
    core: SessionCore,
    detector: ChatLogDetector,
}

impl UxReviewerSession {
    pub fn new(work_dir: impl Into<PathBuf>, env: SessionEnv) -> Self {
        let work_dir = work_dir.into();
        let detector =
            ChatLogDetector::new(env.config.transcripts.ux_reviewer.clone(), work_dir.clone());
        Self {
            core: SessionCore::new(AgentKind::UxReviewer, work_dir, env),
            detector,
        }
    }
}

#[async_trait]
impl AgentSession for UxReviewerSession {
    fn id(&self) -> &SessionId {
        self.core.id()
    }

    fn kind(&self) -> AgentKind {
        AgentKind::UxReviewer
    }

    async fn start(&mut self) -> Result<()> {
        self.core.start(&LaunchSpec::for_kind(AgentKind::UxReviewer)).await
    }

    async fn send_message(&mut self, text: &str) -> Result<TokenPair> {
        self.core.send(text).await
    }

    async fn wait_for_completion(&mut self) -> Result<()> {
        let request = self.core.pending()?;
        let detector = &self.detector;
        self.core
            .await_signal("completion", |_| ready(detector.is_complete(&request)))
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
