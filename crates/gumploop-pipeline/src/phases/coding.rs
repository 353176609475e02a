use tracing::{info, warn};

use gumploop_models::{AgentKind, Phase, ProgressEvent};
use gumploop_persistence::ArtifactRead;

use crate::approval::{Verdict, REVIEW_MARKERS};
use crate::error::Result;
use crate::orchestrator::{PhaseRun, PipelineOrchestrator};
use crate::prompts::{self, Step};
use crate::report::PhaseReport;

use super::actions::{CODE_REVIEWED, CODE_WRITTEN};
use super::{cap_exhausted, missing_prerequisite};

impl PipelineOrchestrator {
    /// Implementer codes the approved plan until the technical reviewer
    /// approves.
    pub async fn code(&self, max_iterations: Option<u32>) -> Result<PhaseReport> {
        let Some((work_dir, state)) = self.current_project() else {
            return Ok(PhaseReport::failure(missing_prerequisite(
                Phase::Coding,
                "no project yet, run plan first",
            )));
        };
        if !state.is_complete(Phase::Planning) {
            return Ok(PhaseReport::failure(missing_prerequisite(
                Phase::Coding,
                "the plan has not been approved",
            )));
        }
        let max = max_iterations.unwrap_or(self.config.code_iterations).max(1);

        let kinds = [AgentKind::Implementer, AgentKind::TechReviewer];
        let mut run = self.open_phase(Phase::Coding, &work_dir, state, &kinds)?;
        let outcome = self.coding_loop(&mut run, max).await;
        self.close_phase(run, outcome).await
    }

    async fn coding_loop(&self, run: &mut PhaseRun, max: u32) -> Result<PhaseReport> {
        run.crew.start_all().await?;
        let plan = run.layout.plan();
        let review = run.layout.code_review();
        let log = run.log.path().to_path_buf();
        let mut feedback: Option<String> = None;

        for iteration in 1..=max {
            run.begin_iteration(&self.store, iteration)?;
            run.layout.clear(&review);

            let event = ProgressEvent::new(AgentKind::Implementer.agent_name(), CODE_WRITTEN, iteration);
            let step = Step {
                output: None,
                log: &log,
                event: &event,
            };
            let prompt = prompts::implement(step, &plan, feedback.as_deref());
            run.crew
                .assign(AgentKind::Implementer, CODE_WRITTEN, prompt, iteration)
                .await?;

            let event = ProgressEvent::new(AgentKind::TechReviewer.agent_name(), CODE_REVIEWED, iteration);
            let step = Step {
                output: Some(review.as_path()),
                log: &log,
                event: &event,
            };
            let prompt = prompts::code_review(step, &plan);
            run.crew
                .assign(AgentKind::TechReviewer, CODE_REVIEWED, prompt, iteration)
                .await?;

            let read = ArtifactRead::from_path(&review);
            match REVIEW_MARKERS.judge(&read) {
                Verdict::Approved => {
                    info!(iteration, "code approved");
                    run.state.set_complete(Phase::Coding, true);
                    return Ok(PhaseReport::success(format!(
                        "Code approved by the technical reviewer in iteration {}.\nReview: {}",
                        iteration,
                        review.display()
                    )));
                }
                Verdict::Rejected => {
                    info!(iteration, "code needs revision");
                    feedback = read.ready().map(str::to_string);
                }
                Verdict::Unreadable => {
                    warn!(iteration, path = %review.display(), "code review missing or too short, retrying");
                }
            }
        }

        Ok(PhaseReport::failure(cap_exhausted(Phase::Coding, max)))
    }
}
