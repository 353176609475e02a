//! Phase executors for gumploop.
//!
//! A [`PipelineOrchestrator`] runs one phase at a time against a project
//! directory: it creates the agent sessions the phase needs, sends each
//! step's prompt, waits for the matching progress event and reads the
//! agents' artifacts back to decide whether to loop again.
//!
//! ```text
//! discover / research   all personas explore, implementer merges, reviewers agree
//! plan                  implementer plans, both reviewers approve
//! code                  implementer codes, technical reviewer approves
//! test                  technical reviewer runs the suite
//! debug                 analyze, fix, re-test
//! ```
//!
//! Every operation returns a [`PhaseReport`]. Errors are reserved for
//! aborted phases (timeouts, I/O failures); by the time one is returned
//! the phase's sessions have been stopped and the state marked idle.

pub mod approval;
pub mod config;
pub mod crew;
pub mod error;
pub mod orchestrator;
pub mod phases;
pub mod prompts;
pub mod report;

pub use approval::{consensus, Markers, Verdict, REVIEW_MARKERS, TEST_MARKERS};
pub use config::{PipelineConfig, ResearchDepth};
pub use crew::{Assignment, Crew};
pub use error::{PipelineError, Result};
pub use orchestrator::PipelineOrchestrator;
pub use phases::{actions, reset_state, status_report};
pub use report::PhaseReport;
