//! Textual outcome of an externally invoked operation.

use std::fmt;

/// What an operation reports back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    pub success: bool,
    pub text: String,
}

impl PhaseReport {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            success: false,
            text: text.into(),
        }
    }
}

impl fmt::Display for PhaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
