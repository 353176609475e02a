use std::fmt::Write as _;
use std::path::PathBuf;

use tracing::{info, warn};

use gumploop_models::{AgentKind, PipelineState};
use gumploop_persistence::{ArtifactRead, ProjectLayout, StateStore};

use crate::error::Result;
use crate::orchestrator::PipelineOrchestrator;
use crate::report::PhaseReport;

fn flag(done: bool) -> &'static str {
    if done {
        "yes"
    } else {
        "no"
    }
}

fn presence(read: &ArtifactRead) -> &'static str {
    match read {
        ArtifactRead::Ready(_) => "present",
        ArtifactRead::TooShort(_) => "too short",
        ArtifactRead::Missing => "missing",
    }
}

/// Every artifact a full pipeline run can produce, in pipeline order.
fn artifact_paths(layout: &ProjectLayout) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for agent in AgentKind::ALL {
        paths.push(layout.discovery(agent.agent_name()));
    }
    paths.push(layout.discovery_summary());
    for agent in AgentKind::ALL {
        paths.push(layout.research(agent.agent_name()));
    }
    paths.push(layout.research_summary());
    for agent in AgentKind::REVIEWERS {
        paths.push(layout.consensus(agent.agent_name()));
    }
    paths.push(layout.plan());
    for agent in AgentKind::REVIEWERS {
        paths.push(layout.review(agent.agent_name()));
    }
    paths.push(layout.code_review());
    paths.push(layout.test_results());
    paths.push(layout.bug_analysis());
    paths
}

fn render_status(state: &PipelineState) -> String {
    let mut out = String::new();
    let phase = state
        .current_phase
        .map(|p| p.to_string())
        .unwrap_or_else(|| "idle".to_string());
    let _ = writeln!(out, "Phase:            {}", phase);
    let _ = writeln!(
        out,
        "Task:             {}",
        if state.task.is_empty() { "-" } else { &state.task }
    );
    let _ = writeln!(
        out,
        "Working dir:      {}",
        state
            .working_directory
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    let _ = writeln!(out, "Iteration:        {}", state.iteration_count);
    let _ = writeln!(out, "Discovery done:   {}", flag(state.flags.discovery_complete));
    let _ = writeln!(out, "Research done:    {}", flag(state.flags.research_complete));
    let _ = writeln!(out, "Plan approved:    {}", flag(state.flags.planning_complete));
    let _ = writeln!(out, "Code approved:    {}", flag(state.flags.coding_complete));
    let _ = writeln!(out, "Tests passing:    {}", flag(state.flags.testing_complete));
    let last_test = match state.last_test_passed {
        Some(true) => "passed",
        Some(false) => "failed",
        None => "not run",
    };
    let _ = writeln!(out, "Last test run:    {}", last_test);
    let _ = writeln!(out, "Debug iterations: {}", state.debug_iterations);
    if state.active_session_ids.is_empty() {
        let _ = writeln!(out, "Sessions:         none");
    } else {
        let _ = writeln!(out, "Sessions:         {}", state.active_session_ids.join(", "));
    }

    if let Some(dir) = &state.working_directory {
        let layout = ProjectLayout::new(dir);
        let _ = writeln!(out, "\nArtifacts in {}:", layout.root().display());
        for path in artifact_paths(&layout) {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let _ = writeln!(out, "  {:<24} {}", name, presence(&ArtifactRead::from_path(&path)));
        }
    }
    out
}

/// State of the project the last phase ran in, else the global mirror.
fn latest_state(store: &StateStore) -> PipelineState {
    let global = store.load(None);
    match &global.working_directory {
        Some(dir) => store.load(Some(dir.as_path())),
        None => global,
    }
}

/// Describes the pipeline state and which artifacts exist.
pub fn status_report(store: &StateStore) -> PhaseReport {
    PhaseReport::success(render_status(&latest_state(store)))
}

/// Replaces the state of the current project with a fresh default.
pub fn reset_state(store: &StateStore) -> Result<PhaseReport> {
    let work_dir = store.load(None).working_directory;
    let state = store.reset(work_dir.as_deref())?;
    info!(work_dir = ?state.working_directory, "pipeline state reset");
    let text = match &state.working_directory {
        Some(dir) => format!("Pipeline state reset for {}.", dir.display()),
        None => "Pipeline state reset.".to_string(),
    };
    Ok(PhaseReport::success(text))
}

impl PipelineOrchestrator {
    pub fn status(&self) -> PhaseReport {
        status_report(&self.store)
    }

    pub fn reset(&self) -> Result<PhaseReport> {
        reset_state(&self.store)
    }

    /// Kills every agent session and marks the pipeline idle.
    pub async fn stop(&self) -> Result<PhaseReport> {
        let mut killed = self.registry.kill_all();

        if let Some(tmux) = &self.tmux {
            match tmux.list_sessions() {
                Ok(sessions) => {
                    for session in sessions.iter().filter(|s| s.is_gumploop()) {
                        match tmux.kill_session(&session.name) {
                            Ok(true) if !killed.contains(&session.name) => {
                                killed.push(session.name.clone())
                            }
                            Ok(_) => {}
                            Err(e) => warn!(session = %session.name, error = %e, "failed to kill session"),
                        }
                    }
                }
                Err(e) => warn!(error = %e, "could not list tmux sessions"),
            }
        }

        let mut state = latest_state(&self.store);
        let interrupted = state.current_phase;
        state.end_phase();
        self.store.save(&mut state)?;
        info!(sessions = killed.len(), phase = ?interrupted, "pipeline stopped");

        let mut text = match interrupted {
            Some(phase) => format!("Stopped {}.", phase),
            None => "No phase was running.".to_string(),
        };
        if killed.is_empty() {
            text.push_str(" No sessions to kill.");
        } else {
            let _ = write!(text, " Killed: {}", killed.join(", "));
        }
        Ok(PhaseReport::success(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gumploop_models::Phase;

    #[test]
    fn test_render_status_idle_without_project() {
        let text = render_status(&PipelineState::default());
        assert!(text.contains("Phase:            idle"));
        assert!(text.contains("Last test run:    not run"));
        assert!(!text.contains("Artifacts"));
    }

    #[test]
    fn test_render_status_lists_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        layout.ensure().unwrap();
        std::fs::write(layout.plan(), "x".repeat(80)).unwrap();

        let mut state = PipelineState::for_directory(dir.path());
        state.current_phase = Some(Phase::Coding);
        state.set_complete(Phase::Planning, true);
        state.last_test_passed = Some(false);

        let text = render_status(&state);
        assert!(text.contains("Phase:            coding"));
        assert!(text.contains("Plan approved:    yes"));
        assert!(text.contains("Last test run:    failed"));
        let plan_line = text.lines().find(|l| l.trim_start().starts_with("plan.md")).unwrap();
        assert!(plan_line.ends_with("present"));
        let review_line = text
            .lines()
            .find(|l| l.trim_start().starts_with("code-review.md"))
            .unwrap();
        assert!(review_line.ends_with("missing"));
    }
}
