use std::path::{Path, PathBuf};

use tracing::{info, warn};

use gumploop_core::resolve_work_dir;
use gumploop_models::{AgentKind, Phase, ProgressEvent};
use gumploop_persistence::{ArtifactRead, ProjectLayout};

use crate::approval::{consensus, Verdict, REVIEW_MARKERS};
use crate::config::ResearchDepth;
use crate::crew::Assignment;
use crate::error::Result;
use crate::orchestrator::{PhaseRun, PipelineOrchestrator};
use crate::prompts::{self, Step};
use crate::report::PhaseReport;

use super::actions::{CONSENSUS_WRITTEN, DISCOVERY_WRITTEN, RESEARCH_WRITTEN, SUMMARY_WRITTEN};
use super::{cap_exhausted, collect_feedback};

/// The two explore-synthesize-agree phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExplorationKind {
    Discovery,
    Research,
}

impl ExplorationKind {
    fn phase(&self) -> Phase {
        match self {
            ExplorationKind::Discovery => Phase::Discovery,
            ExplorationKind::Research => Phase::Research,
        }
    }

    fn findings_action(&self) -> &'static str {
        match self {
            ExplorationKind::Discovery => DISCOVERY_WRITTEN,
            ExplorationKind::Research => RESEARCH_WRITTEN,
        }
    }

    fn findings(&self, layout: &ProjectLayout, kind: AgentKind) -> PathBuf {
        match self {
            ExplorationKind::Discovery => layout.discovery(kind.agent_name()),
            ExplorationKind::Research => layout.research(kind.agent_name()),
        }
    }

    fn summary(&self, layout: &ProjectLayout) -> PathBuf {
        match self {
            ExplorationKind::Discovery => layout.discovery_summary(),
            ExplorationKind::Research => layout.research_summary(),
        }
    }

    fn goal(&self, subject: &str) -> String {
        match self {
            ExplorationKind::Discovery => format!(
                "Explore the project in {} and describe its purpose, architecture, \
                 conventions and the most valuable next improvements.",
                subject
            ),
            ExplorationKind::Research => format!("Research this question: {}", subject),
        }
    }
}

impl PipelineOrchestrator {
    /// All three personas explore the project, the implementer merges their
    /// findings, and both reviewers must agree with the summary.
    pub async fn discover(
        &self,
        work_dir: &Path,
        max_iterations: Option<u32>,
    ) -> Result<PhaseReport> {
        let max = max_iterations
            .unwrap_or(self.config.discover_iterations)
            .max(1);
        let work_dir = resolve_work_dir(Some(work_dir));
        let subject = work_dir.display().to_string();
        self.explore(ExplorationKind::Discovery, &work_dir, &subject, max)
            .await
    }

    /// Like discovery, but about a question; depth bounds the rounds.
    pub async fn research(
        &self,
        question: &str,
        work_dir: &Path,
        depth: ResearchDepth,
    ) -> Result<PhaseReport> {
        let work_dir = resolve_work_dir(Some(work_dir));
        self.explore(ExplorationKind::Research, &work_dir, question, depth.rounds())
            .await
    }

    async fn explore(
        &self,
        kind: ExplorationKind,
        work_dir: &Path,
        subject: &str,
        rounds: u32,
    ) -> Result<PhaseReport> {
        let state = self.store.load_project(work_dir);
        let mut run = self.open_phase(kind.phase(), work_dir, state, &AgentKind::ALL)?;
        let outcome = self.exploration_loop(&mut run, kind, subject, rounds).await;
        self.close_phase(run, outcome).await
    }

    async fn exploration_loop(
        &self,
        run: &mut PhaseRun,
        kind: ExplorationKind,
        subject: &str,
        rounds: u32,
    ) -> Result<PhaseReport> {
        run.crew.start_all().await?;
        let log = run.log.path().to_path_buf();
        let summary = kind.summary(&run.layout);
        let findings: Vec<(AgentKind, PathBuf)> = AgentKind::ALL
            .iter()
            .map(|agent| (*agent, kind.findings(&run.layout, *agent)))
            .collect();
        let verdict_files: Vec<(AgentKind, PathBuf)> = AgentKind::REVIEWERS
            .iter()
            .map(|agent| (*agent, run.layout.consensus(agent.agent_name())))
            .collect();
        let goal = kind.goal(subject);
        let mut feedback: Option<String> = None;

        for iteration in 1..=rounds {
            run.begin_iteration(&self.store, iteration)?;
            for (_, path) in findings.iter().chain(&verdict_files) {
                run.layout.clear(path);
            }
            run.layout.clear(&summary);

            let assignments: Vec<Assignment> = findings
                .iter()
                .map(|(agent, path)| {
                    let event = ProgressEvent::new(agent.agent_name(), kind.findings_action(), iteration);
                    let step = Step {
                        output: Some(path.as_path()),
                        log: &log,
                        event: &event,
                    };
                    let prompt = prompts::explore(step, agent.role(), &goal, feedback.as_deref());
                    Assignment::new(*agent, kind.findings_action(), prompt)
                })
                .collect();
            run.crew.dispatch(&assignments, iteration).await?;

            let ready: Vec<&Path> = findings
                .iter()
                .filter(|(_, path)| ArtifactRead::from_path(path).ready().is_some())
                .map(|(_, path)| path.as_path())
                .collect();
            if ready.is_empty() {
                warn!(iteration, "no usable findings, retrying");
                continue;
            }

            let event = ProgressEvent::new(AgentKind::Implementer.agent_name(), SUMMARY_WRITTEN, iteration);
            let step = Step {
                output: Some(summary.as_path()),
                log: &log,
                event: &event,
            };
            let prompt = prompts::synthesize(step, &ready);
            run.crew
                .assign(AgentKind::Implementer, SUMMARY_WRITTEN, prompt, iteration)
                .await?;
            if ArtifactRead::from_path(&summary).ready().is_none() {
                warn!(iteration, path = %summary.display(), "summary missing or too short, retrying");
                continue;
            }

            let assignments: Vec<Assignment> = verdict_files
                .iter()
                .map(|(agent, path)| {
                    let event = ProgressEvent::new(agent.agent_name(), CONSENSUS_WRITTEN, iteration);
                    let step = Step {
                        output: Some(path.as_path()),
                        log: &log,
                        event: &event,
                    };
                    let prompt = prompts::consensus_review(step, agent.role(), &summary);
                    Assignment::new(*agent, CONSENSUS_WRITTEN, prompt)
                })
                .collect();
            run.crew.dispatch(&assignments, iteration).await?;

            let reads: Vec<ArtifactRead> = verdict_files
                .iter()
                .map(|(_, path)| ArtifactRead::from_path(path))
                .collect();
            let verdicts: Vec<Verdict> = reads.iter().map(|r| REVIEW_MARKERS.judge(r)).collect();
            info!(phase = %run.phase, iteration, verdicts = ?verdicts, "summary reviewed");

            if consensus(&verdicts) {
                run.state.set_complete(run.phase, true);
                return Ok(PhaseReport::success(format!(
                    "{} reached consensus in round {}.\nSummary: {}",
                    run.phase,
                    iteration,
                    summary.display()
                )));
            }
            feedback = Some(collect_feedback(&verdict_files, &reads));
        }

        Ok(PhaseReport::failure(cap_exhausted(run.phase, rounds)))
    }
}
