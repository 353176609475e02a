//! Approval oracle and reviewer consensus.

use gumploop_persistence::ArtifactRead;

/// Accept/reject marker pair searched for in an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers {
    pub accept: &'static str,
    pub reject: &'static str,
}

/// Markers used in plan, code and consensus reviews.
pub const REVIEW_MARKERS: Markers = Markers {
    accept: "APPROVED",
    reject: "NEEDS_REVISION",
};

/// Markers used in test result reports.
pub const TEST_MARKERS: Markers = Markers {
    accept: "TESTS_PASSED",
    reject: "TESTS_FAILED",
};

/// Judgement of one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Rejected,
    /// Missing or too short to judge.
    Unreadable,
}

impl Markers {
    /// Approved iff the accept marker is present and the reject marker is
    /// not. Rejection wins when both appear.
    pub fn is_approved(&self, document: &str) -> bool {
        document.contains(self.accept) && !document.contains(self.reject)
    }

    /// Judges an artifact read from disk.
    pub fn judge(&self, artifact: &ArtifactRead) -> Verdict {
        match artifact.ready() {
            Some(doc) if self.is_approved(doc) => Verdict::Approved,
            Some(_) => Verdict::Rejected,
            None => Verdict::Unreadable,
        }
    }
}

/// True only if every reviewer approved in the same round.
pub fn consensus(verdicts: &[Verdict]) -> bool {
    !verdicts.is_empty() && verdicts.iter().all(|v| *v == Verdict::Approved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approved_requires_marker() {
        assert!(REVIEW_MARKERS.is_approved("Looks good.\n\nAPPROVED"));
        assert!(!REVIEW_MARKERS.is_approved("Looks good."));
    }

    #[test]
    fn test_revision_wins_over_approval() {
        let doc = "APPROVED for the API part.\nNEEDS_REVISION: error handling is missing.";
        assert!(!REVIEW_MARKERS.is_approved(doc));
    }

    #[test]
    fn test_failure_wins_in_test_results() {
        assert!(TEST_MARKERS.is_approved("42 passed\nTESTS_PASSED"));
        assert!(!TEST_MARKERS.is_approved("TESTS_PASSED (unit)\nTESTS_FAILED (integration)"));
    }

    #[test]
    fn test_judge_artifacts() {
        let long = |s: &str| format!("{}{}", "x".repeat(60), s);
        assert_eq!(
            REVIEW_MARKERS.judge(&ArtifactRead::Ready(long("APPROVED"))),
            Verdict::Approved
        );
        assert_eq!(
            REVIEW_MARKERS.judge(&ArtifactRead::Ready(long("NEEDS_REVISION"))),
            Verdict::Rejected
        );
        assert_eq!(
            REVIEW_MARKERS.judge(&ArtifactRead::TooShort("APPROVED".into())),
            Verdict::Unreadable
        );
        assert_eq!(REVIEW_MARKERS.judge(&ArtifactRead::Missing), Verdict::Unreadable);
    }

    #[test]
    fn test_split_review_is_no_consensus() {
        assert!(!consensus(&[Verdict::Approved, Verdict::Rejected]));
        assert!(!consensus(&[Verdict::Approved, Verdict::Unreadable]));
        assert!(!consensus(&[]));
        assert!(consensus(&[Verdict::Approved, Verdict::Approved]));
    }
}
