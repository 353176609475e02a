use std::path::{Path, PathBuf};

use tracing::{info, warn};

use gumploop_core::resolve_work_dir;
use gumploop_models::{AgentKind, Phase, ProgressEvent};
use gumploop_persistence::ArtifactRead;

use crate::approval::{consensus, Verdict, REVIEW_MARKERS};
use crate::crew::Assignment;
use crate::error::Result;
use crate::orchestrator::{PhaseRun, PipelineOrchestrator};
use crate::prompts::{self, Step};
use crate::report::PhaseReport;

use super::actions::{PLAN_WRITTEN, REVIEW_WRITTEN};
use super::{cap_exhausted, collect_feedback};

impl PipelineOrchestrator {
    /// Implementer drafts `plan.md`; both reviewers must approve it in the
    /// same iteration.
    pub async fn plan(
        &self,
        task: &str,
        work_dir: Option<&Path>,
        max_iterations: Option<u32>,
    ) -> Result<PhaseReport> {
        let work_dir = resolve_work_dir(work_dir);
        let mut state = self.store.load_project(&work_dir);
        state.task = task.to_string();
        let max = max_iterations.unwrap_or(self.config.plan_iterations).max(1);

        let mut run = self.open_phase(Phase::Planning, &work_dir, state, &AgentKind::ALL)?;
        let outcome = self.planning_loop(&mut run, task, max).await;
        self.close_phase(run, outcome).await
    }

    async fn planning_loop(&self, run: &mut PhaseRun, task: &str, max: u32) -> Result<PhaseReport> {
        run.crew.start_all().await?;
        let plan = run.layout.plan();
        let log = run.log.path().to_path_buf();
        let reviews: Vec<(AgentKind, PathBuf)> = AgentKind::REVIEWERS
            .iter()
            .map(|kind| (*kind, run.layout.review(kind.agent_name())))
            .collect();
        run.layout.clear(&plan);
        let mut feedback: Option<String> = None;

        for iteration in 1..=max {
            run.begin_iteration(&self.store, iteration)?;
            for (_, path) in &reviews {
                run.layout.clear(path);
            }

            let event = ProgressEvent::new(AgentKind::Implementer.agent_name(), PLAN_WRITTEN, iteration);
            let step = Step {
                output: Some(plan.as_path()),
                log: &log,
                event: &event,
            };
            let prompt = prompts::plan(step, task, feedback.as_deref());
            run.crew
                .assign(AgentKind::Implementer, PLAN_WRITTEN, prompt, iteration)
                .await?;

            if ArtifactRead::from_path(&plan).ready().is_none() {
                warn!(iteration, path = %plan.display(), "plan missing or too short, retrying");
                continue;
            }

            let assignments: Vec<Assignment> = reviews
                .iter()
                .map(|(kind, path)| {
                    let event = ProgressEvent::new(kind.agent_name(), REVIEW_WRITTEN, iteration);
                    let step = Step {
                        output: Some(path.as_path()),
                        log: &log,
                        event: &event,
                    };
                    Assignment::new(*kind, REVIEW_WRITTEN, prompts::plan_review(step, kind.role(), &plan))
                })
                .collect();
            run.crew.dispatch(&assignments, iteration).await?;

            let reads: Vec<ArtifactRead> = reviews
                .iter()
                .map(|(_, path)| ArtifactRead::from_path(path))
                .collect();
            let verdicts: Vec<Verdict> = reads.iter().map(|r| REVIEW_MARKERS.judge(r)).collect();
            info!(iteration, verdicts = ?verdicts, "plan reviewed");

            if consensus(&verdicts) {
                run.state.set_complete(Phase::Planning, true);
                return Ok(PhaseReport::success(format!(
                    "Plan approved by both reviewers in iteration {}.\nPlan: {}",
                    iteration,
                    plan.display()
                )));
            }
            feedback = Some(collect_feedback(&reviews, &reads));
        }

        Ok(PhaseReport::failure(cap_exhausted(Phase::Planning, max)))
    }
}
