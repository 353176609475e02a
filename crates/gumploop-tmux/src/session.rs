//! Tmux session listing data.

use chrono::{DateTime, TimeZone, Utc};

use crate::{Result, TmuxError};

/// A tmux session as reported by `list-sessions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmuxSession {
    /// Session name.
    pub name: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Whether a client is attached (i.e. a terminal window shows it).
    pub attached: bool,
}

impl TmuxSession {
    /// `list-sessions -F` format matching [`TmuxSession::parse`].
    pub const LIST_FORMAT: &'static str = "#{session_name}:#{session_created}:#{session_attached}";

    /// Parse a session from one `list-sessions` line.
    ///
    /// Expected format: `session_name:created_timestamp:attached_count`
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.rsplitn(3, ':');
        let (Some(attached), Some(created), Some(name)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(TmuxError::ParseError(format!("invalid session format: {}", line)));
        };

        let timestamp: i64 = created
            .trim()
            .parse()
            .map_err(|_| TmuxError::ParseError(format!("invalid timestamp: {}", created)))?;
        let created_at = Utc
            .timestamp_opt(timestamp, 0)
            .single()
            .ok_or_else(|| TmuxError::ParseError(format!("invalid timestamp: {}", timestamp)))?;
        let attached = attached.trim().parse::<u32>().map(|n| n > 0).map_err(|_| {
            TmuxError::ParseError(format!("invalid attached count: {}", attached))
        })?;

        Ok(Self {
            name: name.to_string(),
            created_at,
            attached,
        })
    }

    /// Returns true if this session was created by gumploop.
    pub fn is_gumploop(&self) -> bool {
        self.name.starts_with("gumploop-")
    }
}
