//! Error types for tmux and terminal operations.

use thiserror::Error;

/// Errors that can occur during tmux, terminal or window-manager operations.
#[derive(Error, Debug)]
pub enum TmuxError {
    /// tmux not found in PATH.
    #[error("tmux not found in PATH")]
    NotFound,

    /// Session not found.
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    /// tmux command failed.
    #[error("tmux command failed: {0}")]
    CommandFailed(String),

    /// Terminal emulator could not be launched.
    #[error("failed to launch terminal '{terminal}': {source}")]
    TerminalLaunch {
        terminal: String,
        #[source]
        source: std::io::Error,
    },

    /// Window manager query failed.
    #[error("window manager error: {0}")]
    WindowManager(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse tmux or window-manager output.
    #[error("parse error: {0}")]
    ParseError(String),
}

/// Result type alias for tmux operations.
pub type Result<T> = std::result::Result<T, TmuxError>;
