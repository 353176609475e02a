use std::future::ready;
use std::path::PathBuf;

use async_trait::async_trait;

use gumploop_models::{AgentKind, SessionId, TokenPair};

use crate::config::LaunchSpec;
use crate::detect::{CompletionDetector, DatedTranscriptDetector};
use crate::error::Result;

use super::{AgentSession, SessionCore, SessionEnv};

/// The implementer CLI, confirmed through its dated JSONL transcripts.
#[derive(Debug)]
pub struct ImplementerSession {
    core: SessionCore,
    detector: DatedTranscriptDetector,
}

impl ImplementerSession {
    pub fn new(work_dir: impl Into<PathBuf>, env: SessionEnv) -> Self {
        let detector = DatedTranscriptDetector::new(env.config.transcripts.implementer.clone());
        Self {
            core: SessionCore::new(AgentKind::Implementer, work_dir.into(), env),
            detector,
        }
    }
}

#[async_trait]
impl AgentSession for ImplementerSession {
    fn id(&self) -> &SessionId {
        self.core.id()
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Implementer
    }

    async fn start(&mut self) -> Result<()> {
        self.core.start(&LaunchSpec::for_kind(AgentKind::Implementer)).await
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
