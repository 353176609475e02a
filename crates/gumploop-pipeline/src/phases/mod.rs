//! Phase executors.
//!
//! Every executor has the same shape: check the prerequisite flag (a
//! failure report, not an error), open the phase, run its iteration loop,
//! and close the phase on every path. Iteration caps only ever end in a
//! failure report; gating flags are set on approval alone.

mod admin;
mod coding;
mod exploration;
mod planning;
mod testing;

pub use admin::{reset_state, status_report};

use std::path::PathBuf;

use gumploop_models::{AgentKind, Phase};
use gumploop_persistence::ArtifactRead;

/// Progress actions agents are told to report.
pub mod actions {
    pub const PLAN_WRITTEN: &str = "plan_written";
    pub const REVIEW_WRITTEN: &str = "review_written";
    pub const CODE_WRITTEN: &str = "code_written";
    pub const CODE_REVIEWED: &str = "code_reviewed";
    pub const TESTS_RUN: &str = "tests_run";
    pub const BUG_ANALYZED: &str = "bug_analyzed";
    pub const FIX_APPLIED: &str = "fix_applied";
    pub const DISCOVERY_WRITTEN: &str = "discovery_written";
    pub const RESEARCH_WRITTEN: &str = "research_written";
    pub const SUMMARY_WRITTEN: &str = "summary_written";
    pub const CONSENSUS_WRITTEN: &str = "consensus_written";
}

fn cap_exhausted(phase: Phase, max: u32) -> String {
    format!(
        "{} did not reach approval within {} iteration(s). \
         Review the artifacts and re-run with a larger iteration cap.",
        phase, max
    )
}

fn missing_prerequisite(phase: Phase, needs: &str) -> String {
    format!("Cannot run {}: {}.", phase, needs)
}

/// Concatenates the reviewers' texts for the next round's prompt.
fn collect_feedback(reviews: &[(AgentKind, PathBuf)], reads: &[ArtifactRead]) -> String {
    reviews
        .iter()
        .zip(reads)
        .filter_map(|((kind, _), read)| {
            read.ready()
                .map(|text| format!("## {} ({})\n{}", kind.role(), kind, text.trim()))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_feedback_skips_unreadable() {
        let reviews = vec![
            (AgentKind::UxReviewer, PathBuf::from("/r/review-gemini.md")),
            (AgentKind::TechReviewer, PathBuf::from("/r/review-codex.md")),
        ];
        let reads = vec![
            ArtifactRead::Ready("NEEDS_REVISION: onboarding copy is confusing".into()),
            ArtifactRead::Missing,
        ];
        let text = collect_feedback(&reviews, &reads);
        assert!(text.starts_with("## UX reviewer (gemini)\n"));
        assert!(!text.contains("codex"));
    }
}
