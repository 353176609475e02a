//! Pipeline phases and agent kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Codebase exploration by all personas.
    Discovery,
    /// Question-driven research by all personas.
    Research,
    /// Plan authoring with dual review.
    Planning,
    /// Implementation with code review.
    Coding,
    /// Running the test suite.
    Testing,
    /// Analyze-and-fix loop after failing tests.
    Debugging,
}

impl Phase {
    /// All phases in pipeline order.
    pub const ALL: [Phase; 6] = [
        Phase::Discovery,
        Phase::Research,
        Phase::Planning,
        Phase::Coding,
        Phase::Testing,
        Phase::Debugging,
    ];

    /// Returns the lowercase name used in state files and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::Research => "research",
            Phase::Planning => "planning",
            Phase::Coding => "coding",
            Phase::Testing => "testing",
            Phase::Debugging => "debugging",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str() == s.to_ascii_lowercase())
            .ok_or_else(|| format!("unknown phase: {}", s))
    }
}

/// Role an external agent plays in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Writes plans and code.
    Implementer,
    /// Reviews for user experience and product fit.
    UxReviewer,
    /// Reviews for technical soundness, runs tests.
    TechReviewer,
}

impl AgentKind {
    /// All agent kinds.
    pub const ALL: [AgentKind; 3] = [
        AgentKind::Implementer,
        AgentKind::UxReviewer,
        AgentKind::TechReviewer,
    ];

    /// The two reviewer personas that must reach consensus.
    pub const REVIEWERS: [AgentKind; 2] = [AgentKind::UxReviewer, AgentKind::TechReviewer];

    /// Name the agent uses when appending progress events and naming artifacts.
    pub fn agent_name(&self) -> &'static str {
        match self {
            AgentKind::Implementer => "claude",
            AgentKind::UxReviewer => "gemini",
            AgentKind::TechReviewer => "codex",
        }
    }

    /// Human-readable role name.
    pub fn role(&self) -> &'static str {
        match self {
            AgentKind::Implementer => "implementer",
            AgentKind::UxReviewer => "UX reviewer",
            AgentKind::TechReviewer => "technical reviewer",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.agent_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_roundtrip_str() {
        for phase in Phase::ALL {
            assert_eq!(phase.as_str().parse::<Phase>().unwrap(), phase);
        }
        assert!("deploying".parse::<Phase>().is_err());
    }

    #[test]
    fn test_phase_serde_snake_case() {
        let json = serde_json::to_string(&Phase::Debugging).unwrap();
        assert_eq!(json, "\"debugging\"");
    }

    #[test]
    fn test_agent_names() {
        assert_eq!(AgentKind::Implementer.agent_name(), "claude");
        assert_eq!(AgentKind::UxReviewer.to_string(), "gemini");
        assert_eq!(AgentKind::REVIEWERS.len(), 2);
        assert!(!AgentKind::REVIEWERS.contains(&AgentKind::Implementer));
    }
}
