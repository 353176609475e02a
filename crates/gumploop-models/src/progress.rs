//! Progress events appended by external agents.
//!
//! Wire format is one JSON object per line:
//!
//! ```text
//! {"agent":"claude","action":"plan_written","iteration":1}
//! ```

use serde::{Deserialize, Serialize};

/// A named milestone reported by an agent for one iteration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Agent name (e.g. "claude").
    pub agent: String,
    /// Milestone name (e.g. "plan_written").
    pub action: String,
    /// Iteration the milestone belongs to.
    pub iteration: u32,
}

impl ProgressEvent {
    /// Creates a new progress event.
    pub fn new(agent: impl Into<String>, action: impl Into<String>, iteration: u32) -> Self {
        Self {
            agent: agent.into(),
            action: action.into(),
            iteration,
        }
    }

    /// Returns true if this event is the given (agent, action, iteration) tuple.
    pub fn matches(&self, agent: &str, action: &str, iteration: u32) -> bool {
        self.agent == agent && self.action == action && self.iteration == iteration
    }

    /// Parses a single log line, returning `None` for blank or malformed lines.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        serde_json::from_str(line).ok()
    }

    /// Parses a whole log, skipping anything that is not a valid event.
    pub fn parse_log(content: &str) -> Vec<Self> {
        content.lines().filter_map(Self::parse_line).collect()
    }

    /// Renders the exact line an agent is asked to append.
    pub fn to_json_line(&self) -> String {
        // Serializing three plain fields cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
