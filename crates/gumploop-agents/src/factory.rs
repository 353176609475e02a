//! Choosing the session implementation for an agent kind.

use std::path::Path;

use gumploop_models::AgentKind;

use crate::session::{
    AgentSession, ImplementerSession, SessionEnv, TechReviewerSession, UxReviewerSession,
};

/// Creates sessions for the phase executors.
pub trait SessionFactory: Send + Sync {
    /// Creates an unstarted session of `kind` working in `work_dir`.
    fn create(&self, kind: AgentKind, work_dir: &Path) -> Box<dyn AgentSession>;
}

/// Factory producing real tmux-backed sessions.
#[derive(Debug, Clone)]
pub struct TmuxSessionFactory {
    env: SessionEnv,
}

impl TmuxSessionFactory {
    pub fn new(env: SessionEnv) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &SessionEnv {
        &self.env
    }
}

impl SessionFactory for TmuxSessionFactory {
    fn create(&self, kind: AgentKind, work_dir: &Path) -> Box<dyn AgentSession> {
        let env = self.env.clone();
        match kind {
            AgentKind::Implementer => Box::new(ImplementerSession::new(work_dir, env)),
            AgentKind::UxReviewer => Box::new(UxReviewerSession::new(work_dir, env)),
            AgentKind::TechReviewer => Box::new(TechReviewerSession::new(work_dir, env)),
        }
    }
}
