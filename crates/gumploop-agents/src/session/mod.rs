//! Agent session handles.
//!
//! Each external CLI gets one [`AgentSession`] implementation. They share
//! launching, delivery and the adaptive wait through [`SessionCore`] and
//! differ only in launch flags, ready indicators and how completion is
//! detected.

mod base;
mod implementer;
mod tech_reviewer;
mod ux_reviewer;

use std::sync::Arc;

use async_trait::async_trait;

use gumploop_models::{AgentKind, SessionId, TokenPair};
use gumploop_tmux::{Placement, ProcessRegistry, SessionLauncher};

use crate::config::AgentConfig;
use crate::error::Result;

pub use base::SessionCore;
pub use implementer::ImplementerSession;
pub use tech_reviewer::TechReviewerSession;
pub use ux_reviewer::UxReviewerSession;

/// Shared collaborators every session needs.
#[derive(Debug, Clone)]
pub struct SessionEnv {
    pub launcher: SessionLauncher,
    pub registry: Arc<ProcessRegistry>,
    pub placement: Option<Placement>,
    pub config: Arc<AgentConfig>,
}

/// One running agent CLI.
///
/// A session is owned by the phase that created it and must be stopped on
/// every exit path of that phase.
#[async_trait]
pub trait AgentSession: Send {
    /// Session identifier (also the tmux session name).
    fn id(&self) -> &SessionId;

    /// Which agent this session runs.
    fn kind(&self) -> AgentKind;

    /// Launches the CLI and waits (bounded) for it to accept input.
    async fn start(&mut self) -> Result<()>;

    /// Delivers a message, returning the token pair it was tagged with.
    async fn send_message(&mut self, text: &str) -> Result<TokenPair>;

    /// Waits until the last message has been answered.
    async fn wait_for_completion(&mut self) -> Result<()>;

    /// Waits until the project's progress log holds the given milestone.
    async fn wait_for_progress_event(
        &mut self,
        agent: &str,
        action: &str,
        iteration: u32,
    ) -> Result<()>;

    /// Kills the CLI and its session. Safe to call more than once.
    async fn stop(&mut self);
}
