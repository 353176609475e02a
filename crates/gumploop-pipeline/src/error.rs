//! Error types for the pipeline.

use thiserror::Error;

/// Errors that abort a phase.
///
/// Expected outcomes (missing prerequisites, rejected reviews, exhausted
/// iteration caps) are reported through [`crate::PhaseReport`] instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Agent session error, including timeouts.
    #[error("Agent error: {0}")]
    Agent(#[from] gumploop_agents::AgentError),

    /// State or artifact I/O error.
    #[error("Persistence error: {0}")]
    Persistence(#[from] gumploop_persistence::PersistenceError),

    /// tmux error outside of a session.
    #[error("tmux error: {0}")]
    Tmux(#[from] gumploop_tmux::TmuxError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
