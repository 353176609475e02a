//! Iteration limits for the phase executors.

use std::fmt;
use std::str::FromStr;

/// How many research rounds to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResearchDepth {
    Quick,
    #[default]
    Standard,
    Deep,
}

impl ResearchDepth {
    /// Maximum exploration rounds for this depth.
    pub fn rounds(&self) -> u32 {
        match self {
            ResearchDepth::Quick => 1,
            ResearchDepth::Standard => 2,
            ResearchDepth::Deep => 3,
        }
    }
}

impl fmt::Display for ResearchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResearchDepth::Quick => write!(f, "quick"),
            ResearchDepth::Standard => write!(f, "standard"),
            ResearchDepth::Deep => write!(f, "deep"),
        }
    }
}

impl FromStr for ResearchDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(ResearchDepth::Quick),
            "standard" => Ok(ResearchDepth::Standard),
            "deep" => Ok(ResearchDepth::Deep),
            other => Err(format!("unknown research depth: {}", other)),
        }
    }
}

/// Default iteration caps, overridable per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub plan_iterations: u32,
    pub code_iterations: u32,
    pub debug_iterations: u32,
    pub discover_iterations: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            plan_iterations: 3,
            code_iterations: 5,
            debug_iterations: 3,
            discover_iterations: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_rounds() {
        assert_eq!(ResearchDepth::Quick.rounds(), 1);
        assert_eq!(ResearchDepth::default().rounds(), 2);
        assert_eq!("DEEP".parse::<ResearchDepth>().unwrap().rounds(), 3);
        assert!("bottomless".parse::<ResearchDepth>().is_err());
    }

    #[test]
    fn test_default_caps() {
        let config = PipelineConfig::default();
        assert_eq!(config.plan_iterations, 3);
        assert_eq!(config.code_iterations, 5);
        assert_eq!(config.debug_iterations, 3);
        assert_eq!(config.discover_iterations, 3);
    }
}
