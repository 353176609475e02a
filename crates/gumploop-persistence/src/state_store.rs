//! State store for pipeline state persistence.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use gumploop_core::config::{global_state_file, project_dir};
use gumploop_models::{Phase, PipelineState};

use crate::atomic::atomic_write_json;
use crate::error::Result;

/// Name of the project-scoped state file inside `<project>/.gumploop/`.
const PROJECT_STATE_FILE: &str = ".state.json";

/// Boolean fields every state file must carry.
const REQUIRED_FLAGS: &[&str] = &[
    "discoveryComplete",
    "researchComplete",
    "planningComplete",
    "codingComplete",
    "testingComplete",
];

/// Returns true if `value` has every required field with the right type.
///
/// Anything failing this predicate is treated as a corrupt file.
pub fn is_valid_state(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    let phase_ok = match obj.get("currentPhase") {
        Some(Value::Null) => true,
        Some(Value::String(s)) => s.parse::<Phase>().is_ok(),
        _ => false,
    };
    let dir_ok = matches!(
        obj.get("workingDirectory"),
        Some(Value::Null) | Some(Value::String(_))
    );
    let task_ok = obj.get("task").is_some_and(Value::is_string);
    let iteration_ok = obj
        .get("iterationCount")
        .and_then(Value::as_u64)
        .is_some_and(|n| n <= u64::from(u32::MAX));
    let flags_ok = REQUIRED_FLAGS
        .iter()
        .all(|f| obj.get(*f).is_some_and(Value::is_boolean));
    let sessions_ok = obj
        .get("activeSessionIds")
        .and_then(Value::as_array)
        .is_some_and(|ids| ids.iter().all(Value::is_string));
    let stamp_ok = obj.get("lastUpdateTimestamp").is_some_and(Value::is_i64);
    let optional_ok = matches!(
        obj.get("lastTestPassed"),
        None | Some(Value::Null) | Some(Value::Bool(_))
    ) && obj.get("debugIterations").is_none_or(Value::is_u64);

    phase_ok && dir_ok && task_ok && iteration_ok && flags_ok && sessions_ok && stamp_ok && optional_ok
}

/// Loads and saves the pipeline state.
///
/// The state lives in two places:
/// ```text
/// <project>/.gumploop/.state.json   # authoritative, per project
/// ~/.gumploop/state.json            # mirror for callers without a working directory
/// ```
#[derive(Debug, Clone)]
pub struct StateStore {
    global_path: PathBuf,
}

impl StateStore {
    /// Creates a store that mirrors to the given global fallback file.
    pub fn new(global_path: impl Into<PathBuf>) -> Self {
        Self {
            global_path: global_path.into(),
        }
    }

    /// Creates a store using the configured global state file.
    pub fn from_env() -> Self {
        Self::new(global_state_file())
    }

    /// Returns the project-scoped state file path.
    pub fn project_state_path(work_dir: &Path) -> PathBuf {
        project_dir(work_dir).join(PROJECT_STATE_FILE)
    }

    /// Returns the global fallback file path.
    pub fn global_path(&self) -> &Path {
        &self.global_path
    }

    /// Loads the state, never failing.
    ///
    /// Tries the project file, then the global fallback, then builds a
    /// default. Missing, unreadable or structurally invalid files are
    /// skipped.
    pub fn load(&self, work_dir: Option<&Path>) -> PipelineState {
        let project_path = work_dir.map(Self::project_state_path);
        let candidates = project_path.iter().chain(std::iter::once(&self.global_path));

        for path in candidates {
            if let Some(state) = Self::try_load(path) {
                return state;
            }
        }

        debug!("no usable state file, using default state");
        match work_dir {
            Some(dir) => PipelineState::for_directory(dir),
            None => PipelineState::default(),
        }
    }

    /// Loads the state of one specific project.
    ///
    /// The global fallback is only accepted when it belongs to `work_dir`;
    /// another project's mirror yields a fresh state for `work_dir`.
    pub fn load_project(&self, work_dir: &Path) -> PipelineState {
        let state = self.load(Some(work_dir));
        if state.working_directory.as_deref() == Some(work_dir) {
            return state;
        }
        debug!(
            work_dir = %work_dir.display(),
            found = ?state.working_directory,
            "state belongs to another project, starting fresh"
        );
        PipelineState::for_directory(work_dir)
    }

    fn try_load(path: &Path) -> Option<PipelineState> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "state file not readable");
                return None;
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "state file is not valid JSON");
                return None;
            }
        };

        if !is_valid_state(&value) {
            warn!(path = %path.display(), "state file failed validation, ignoring");
            return None;
        }

        match serde_json::from_value(value) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "state file could not be decoded");
                None
            }
        }
    }

    /// Re-stamps and saves the state to the project file and the global mirror.
    ///
    /// The timestamp strictly increases across saves of the same value.
    pub fn save(&self, state: &mut PipelineState) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        state.last_update_timestamp = now.max(state.last_update_timestamp + 1);

        if let Some(dir) = &state.working_directory {
            atomic_write_json(&Self::project_state_path(dir), state)?;
        }
        atomic_write_json(&self.global_path, state)?;
        Ok(())
    }

    /// Replaces the state with a default bound to `work_dir` and saves it.
    pub fn reset(&self, work_dir: Option<&Path>) -> Result<PipelineState> {
        let mut state = match work_dir {
            Some(dir) => PipelineState::for_directory(dir),
            None => PipelineState::default(),
        };
        self.save(&mut state)?;
        Ok(state)
    }
}
