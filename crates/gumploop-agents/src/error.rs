//! Error types for agent sessions.

use std::time::Duration;

use thiserror::Error;

use gumploop_tmux::TmuxError;

/// Errors that can occur while driving an agent session.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The session has not been started (or was already stopped).
    #[error("session '{0}' is not running")]
    NotStarted(String),

    /// `wait_for_completion` was called without a message in flight.
    #[error("no outstanding request on session '{0}'")]
    NoOutstandingRequest(String),

    /// The adaptive deadline passed before the awaited signal appeared.
    #[error("timed out after {waited:?} waiting for {waiting_for} on '{session}'")]
    Timeout {
        session: String,
        waiting_for: String,
        waited: Duration,
    },

    /// The message could not be staged for pasting.
    #[error("failed to stage message for '{session}': {source}")]
    Delivery {
        session: String,
        #[source]
        source: std::io::Error,
    },

    /// Underlying tmux or terminal failure.
    #[error(transparent)]
    Tmux(#[from] TmuxError),
}

impl AgentError {
    /// Returns true for a deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AgentError::Timeout { .. })
    }
}

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
