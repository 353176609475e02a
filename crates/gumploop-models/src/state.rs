//! Persisted pipeline state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::phase::Phase;

/// Per-phase completion flags consumed as prerequisites by later phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseFlags {
    /// Discovery reached consensus.
    pub discovery_complete: bool,
    /// Research reached consensus.
    pub research_complete: bool,
    /// Plan approved by both reviewers.
    pub planning_complete: bool,
    /// Code approved by the technical reviewer.
    pub coding_complete: bool,
    /// Test suite passed.
    pub testing_complete: bool,
}

/// The single authoritative record of where a project's pipeline stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    /// Phase currently executing, `None` when idle.
    pub current_phase: Option<Phase>,
    /// Task description given to the planning phase.
    pub task: String,
    /// Project directory the pipeline operates on.
    pub working_directory: Option<PathBuf>,
    /// Iteration counter of the current (or last) phase run.
    pub iteration_count: u32,
    /// Completion flags.
    #[serde(flatten)]
    pub flags: PhaseFlags,
    /// Outcome of the most recent test run, if any.
    #[serde(default)]
    pub last_test_passed: Option<bool>,
    /// Number of debug iterations run since the last reset.
    #[serde(default)]
    pub debug_iterations: u32,
    /// Sessions started by the phase currently executing.
    pub active_session_ids: Vec<String>,
    /// Epoch milliseconds of the last save.
    pub last_update_timestamp: i64,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            current_phase: None,
            task: String::new(),
            working_directory: None,
            iteration_count: 0,
            flags: PhaseFlags::default(),
            last_test_passed: None,
            debug_iterations: 0,
            active_session_ids: Vec::new(),
            last_update_timestamp: 0,
        }
    }
}

impl PipelineState {
    /// Creates a default state bound to a working directory.
    pub fn for_directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Returns the completion flag gating on the given phase.
    pub fn is_complete(&self, phase: Phase) -> bool {
        match phase {
            Phase::Discovery => self.flags.discovery_complete,
            Phase::Research => self.flags.research_complete,
            Phase::Planning => self.flags.planning_complete,
            Phase::Coding => self.flags.coding_complete,
            Phase::Testing | Phase::Debugging => self.flags.testing_complete,
        }
    }

    /// Sets the completion flag for the given phase.
    pub fn set_complete(&mut self, phase: Phase, complete: bool) {
        match phase {
            Phase::Discovery => self.flags.discovery_complete = complete,
            Phase::Research => self.flags.research_complete = complete,
            Phase::Planning => self.flags.planning_complete = complete,
            Phase::Coding => self.flags.coding_complete = complete,
            Phase::Testing | Phase::Debugging => self.flags.testing_complete = complete,
        }
    }

    /// Invalidates a phase's earlier approval and everything built on it.
    ///
    /// A new plan voids the code and test results of the old one; new code
    /// voids the last test run. Discovery and research gate nothing.
    pub fn reopen(&mut self, phase: Phase) {
        self.set_complete(phase, false);
        match phase {
            Phase::Planning => {
                self.flags.coding_complete = false;
                self.flags.testing_complete = false;
                self.last_test_passed = None;
                self.debug_iterations = 0;
            }
            Phase::Coding => {
                self.flags.testing_complete = false;
                self.last_test_passed = None;
            }
            Phase::Discovery | Phase::Research | Phase::Testing | Phase::Debugging => {}
        }
    }

    /// Marks a phase as running with the given sessions.
    pub fn begin_phase(&mut self, phase: Phase, session_ids: Vec<String>) {
        self.current_phase = Some(phase);
        self.iteration_count = 0;
        self.active_session_ids = session_ids;
    }

    /// Marks the pipeline idle again.
    pub fn end_phase(&mut self) {
        self.current_phase = None;
        self.active_session_ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let state = PipelineState::default();
        assert!(state.current_phase.is_none());
        assert!(!state.is_complete(Phase::Planning));
        assert!(state.active_session_ids.is_empty());
    }

    #[test]
    fn test_flags_serialize_flat_camel_case() {
        let mut state = PipelineState::for_directory("/tmp/project");
        state.set_complete(Phase::Planning, true);
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["planningComplete"], true);
        assert_eq!(value["codingComplete"], false);
        assert_eq!(value["workingDirectory"], "/tmp/project");
        assert!(value["currentPhase"].is_null());
        assert!(value["activeSessionIds"].is_array());
    }

    #[test]
    fn test_begin_and_end_phase() {
        let mut state = PipelineState::default();
        state.iteration_count = 4;
        state.begin_phase(Phase::Coding, vec!["gumploop-claude-1".to_string()]);
        assert_eq!(state.current_phase, Some(Phase::Coding));
        assert_eq!(state.iteration_count, 0);
        state.end_phase();
        assert!(state.current_phase.is_none());
        assert!(state.active_session_ids.is_empty());
    }

    #[test]
    fn test_reopen_planning_voids_downstream() {
        let mut state = PipelineState::default();
        state.set_complete(Phase::Discovery, true);
        state.set_complete(Phase::Planning, true);
        state.set_complete(Phase::Coding, true);
        state.set_complete(Phase::Testing, true);
        state.last_test_passed = Some(true);
        state.debug_iterations = 2;

        state.reopen(Phase::Planning);
        assert_eq!(
            state.flags,
            PhaseFlags {
                discovery_complete: true,
                ..PhaseFlags::default()
            }
        );
        assert_eq!(state.last_test_passed, None);
        assert_eq!(state.debug_iterations, 0);
    }

    #[test]
    fn test_reopen_coding_keeps_plan() {
        let mut state = PipelineState::default();
        state.set_complete(Phase::Planning, true);
        state.set_complete(Phase::Coding, true);
        state.last_test_passed = Some(false);

        state.reopen(Phase::Coding);
        assert!(state.is_complete(Phase::Planning));
        assert!(!state.is_complete(Phase::Coding));
        assert_eq!(state.last_test_passed, None);
    }

    #[test]
    fn test_reopen_debugging_keeps_failing_run() {
        let mut state = PipelineState::default();
        state.set_complete(Phase::Coding, true);
        state.last_test_passed = Some(false);

        state.reopen(Phase::Debugging);
        assert!(state.is_complete(Phase::Coding));
        assert_eq!(state.last_test_passed, Some(false));
    }

    #[test]
    fn test_testing_and_debugging_share_flag() {
        let mut state = PipelineState::default();
        state.set_complete(Phase::Debugging, true);
        assert!(state.is_complete(Phase::Testing));
    }
}
