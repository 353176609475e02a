use std::path::Path;

use tracing::{info, warn};

use gumploop_models::{AgentKind, Phase, ProgressEvent};
use gumploop_persistence::ArtifactRead;

use crate::approval::{Verdict, TEST_MARKERS};
use crate::error::Result;
use crate::orchestrator::{PhaseRun, PipelineOrchestrator};
use crate::prompts::{self, Step};
use crate::report::PhaseReport;

use super::actions::{BUG_ANALYZED, FIX_APPLIED, TESTS_RUN};
use super::{cap_exhausted, missing_prerequisite};

impl PhaseRun {
    /// Has the technical reviewer run the suite and judges the report.
    async fn run_test_suite(&mut self, iteration: u32) -> Result<Verdict> {
        let results = self.layout.test_results();
        self.layout.clear(&results);
        let log = self.log.path().to_path_buf();

        let event = ProgressEvent::new(AgentKind::TechReviewer.agent_name(), TESTS_RUN, iteration);
        let step = Step {
            output: Some(results.as_path()),
            log: &log,
            event: &event,
        };
        self.crew
            .assign(AgentKind::TechReviewer, TESTS_RUN, prompts::run_tests(step), iteration)
            .await?;

        let verdict = TEST_MARKERS.judge(&ArtifactRead::from_path(&results));
        if verdict != Verdict::Unreadable {
            let passed = verdict == Verdict::Approved;
            self.state.last_test_passed = Some(passed);
            self.state.set_complete(Phase::Testing, passed);
        }
        info!(iteration, verdict = ?verdict, "test run judged");
        Ok(verdict)
    }
}

fn results_text(results: &Path, verdict: Verdict) -> String {
    match verdict {
        Verdict::Approved => format!("Tests passed.\nResults: {}", results.display()),
        Verdict::Rejected => format!(
            "Tests failed. Run debug to analyze and fix.\nResults: {}",
            results.display()
        ),
        Verdict::Unreadable => format!(
            "No usable test report was written to {}.",
            results.display()
        ),
    }
}

impl PipelineOrchestrator {
    /// Technical reviewer runs the test suite once.
    pub async fn test(&self) -> Result<PhaseReport> {
        let Some((work_dir, state)) = self.current_project() else {
            return Ok(PhaseReport::failure(missing_prerequisite(
                Phase::Testing,
                "no project yet, run plan first",
            )));
        };
        if !state.is_complete(Phase::Coding) {
            return Ok(PhaseReport::failure(missing_prerequisite(
                Phase::Testing,
                "the code has not been approved",
            )));
        }

        let mut run = self.open_phase(Phase::Testing, &work_dir, state, &[AgentKind::TechReviewer])?;
        let outcome = self.testing_run(&mut run).await;
        self.close_phase(run, outcome).await
    }

    async fn testing_run(&self, run: &mut PhaseRun) -> Result<PhaseReport> {
        run.crew.start_all().await?;
        run.begin_iteration(&self.store, 1)?;
        let verdict = run.run_test_suite(1).await?;
        let text = results_text(&run.layout.test_results(), verdict);
        Ok(match verdict {
            Verdict::Approved => PhaseReport::success(text),
            _ => PhaseReport::failure(text),
        })
    }

    /// Analyze, fix and re-test until the suite passes.
    pub async fn debug(&self, max_iterations: Option<u32>) -> Result<PhaseReport> {
        let Some((work_dir, state)) = self.current_project() else {
            return Ok(PhaseReport::failure(missing_prerequisite(
                Phase::Debugging,
                "no project yet, run plan first",
            )));
        };
        if !state.is_complete(Phase::Coding) {
            return Ok(PhaseReport::failure(missing_prerequisite(
                Phase::Debugging,
                "the code has not been approved",
            )));
        }
        if state.last_test_passed != Some(false) {
            return Ok(PhaseReport::failure(missing_prerequisite(
                Phase::Debugging,
                "there is no failing test run to debug, run test first",
            )));
        }
        let max = max_iterations.unwrap_or(self.config.debug_iterations).max(1);

        let kinds = [AgentKind::Implementer, AgentKind::TechReviewer];
        let mut run = self.open_phase(Phase::Debugging, &work_dir, state, &kinds)?;
        let outcome = self.debugging_loop(&mut run, max).await;
        self.close_phase(run, outcome).await
    }

    async fn debugging_loop(&self, run: &mut PhaseRun, max: u32) -> Result<PhaseReport> {
        run.crew.start_all().await?;
        let analysis = run.layout.bug_analysis();
        let results = run.layout.test_results();
        let log = run.log.path().to_path_buf();

        for iteration in 1..=max {
            run.state.debug_iterations += 1;
            run.begin_iteration(&self.store, iteration)?;
            run.layout.clear(&analysis);

            let event = ProgressEvent::new(AgentKind::TechReviewer.agent_name(), BUG_ANALYZED, iteration);
            let step = Step {
                output: Some(analysis.as_path()),
                log: &log,
                event: &event,
            };
            let prompt = prompts::analyze_failure(step, &results);
            run.crew
                .assign(AgentKind::TechReviewer, BUG_ANALYZED, prompt, iteration)
                .await?;
            if ArtifactRead::from_path(&analysis).ready().is_none() {
                warn!(iteration, path = %analysis.display(), "bug analysis missing or too short, retrying");
                continue;
            }

            let event = ProgressEvent::new(AgentKind::Implementer.agent_name(), FIX_APPLIED, iteration);
            let step = Step {
                output: None,
                log: &log,
                event: &event,
            };
            let prompt = prompts::apply_fix(step, &analysis);
            run.crew
                .assign(AgentKind::Implementer, FIX_APPLIED, prompt, iteration)
                .await?;

            if run.run_test_suite(iteration).await? == Verdict::Approved {
                return Ok(PhaseReport::success(format!(
                    "Tests pass after {} debug iteration(s).\nResults: {}",
                    iteration,
                    results.display()
                )));
            }
        }

        Ok(PhaseReport::failure(cap_exhausted(Phase::Debugging, max)))
    }
}
