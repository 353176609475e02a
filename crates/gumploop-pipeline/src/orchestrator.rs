//! Orchestrator context shared by all phase executors.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use gumploop_agents::{AgentConfig, SessionEnv, SessionFactory, TmuxSessionFactory};
use gumploop_models::{AgentKind, Phase, PipelineState};
use gumploop_persistence::{ProgressLog, ProjectLayout, StateStore};
use gumploop_tmux::{Placement, ProcessRegistry, SessionLauncher, TerminalEmulator, TmuxOrchestrator};

use crate::config::PipelineConfig;
use crate::crew::Crew;
use crate::error::Result;
use crate::report::PhaseReport;

/// Everything a phase needs, passed explicitly instead of held in globals.
pub struct PipelineOrchestrator {
    pub(crate) config: PipelineConfig,
    pub(crate) store: StateStore,
    pub(crate) factory: Arc<dyn SessionFactory>,
    pub(crate) registry: Arc<ProcessRegistry>,
    pub(crate) tmux: Option<TmuxOrchestrator>,
    placement: Option<Placement>,
}

/// A phase run in progress: its sessions, state and artifact layout.
pub(crate) struct PhaseRun {
    pub phase: Phase,
    pub state: PipelineState,
    pub layout: ProjectLayout,
    pub log: ProgressLog,
    pub crew: Crew,
}

impl PhaseRun {
    /// Records the iteration about to run.
    pub fn begin_iteration(&mut self, store: &StateStore, iteration: u32) -> Result<()> {
        self.state.iteration_count = iteration;
        store.save(&mut self.state)?;
        info!(phase = %self.phase, iteration, "starting iteration");
        Ok(())
    }
}

impl PipelineOrchestrator {
    /// Builds a context driving real tmux sessions.
    ///
    /// Terminal and window placement come from the environment.
    pub fn from_env(config: PipelineConfig, agent_config: AgentConfig) -> Result<Self> {
        let tmux = TmuxOrchestrator::new()?;
        let terminal = TerminalEmulator::from_env();
        let placement = Placement::detect();
        let registry = Arc::new(ProcessRegistry::new());
        info!(
            terminal = %terminal,
            placement = ?placement.as_ref().map(|p| p.target.workspace.as_str()),
            "initializing orchestrator"
        );

        let env = SessionEnv {
            launcher: SessionLauncher::new(tmux.clone(), terminal),
            registry: Arc::clone(&registry),
            placement: placement.clone(),
            config: Arc::new(agent_config),
        };
        Ok(Self {
            config,
            store: StateStore::from_env(),
            factory: Arc::new(TmuxSessionFactory::new(env)),
            registry,
            tmux: Some(tmux),
            placement,
        })
    }

    /// Builds a context around a custom session factory and no tmux.
    pub fn with_factory(
        config: PipelineConfig,
        store: StateStore,
        factory: Arc<dyn SessionFactory>,
    ) -> Self {
        Self {
            config,
            store,
            factory,
            registry: Arc::new(ProcessRegistry::new()),
            tmux: None,
            placement: None,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Workspace agent windows are placed on, if placement is active.
    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    /// The project the last phase ran in, with its authoritative state.
    pub(crate) fn current_project(&self) -> Option<(PathBuf, PipelineState)> {
        let global = self.store.load(None);
        let dir = global.working_directory?;
        let state = self.store.load(Some(dir.as_path()));
        Some((dir, state))
    }

    /// Purges the progress log, creates the sessions and marks the phase
    /// as running. Sessions are not started yet.
    pub(crate) fn open_phase(
        &self,
        phase: Phase,
        work_dir: &Path,
        mut state: PipelineState,
        kinds: &[AgentKind],
    ) -> Result<PhaseRun> {
        let layout = ProjectLayout::new(work_dir);
        layout.ensure()?;
        let log = ProgressLog::for_project(work_dir);
        log.purge()?;

        let crew = Crew::assemble(self.factory.as_ref(), kinds, work_dir);
        state.working_directory = Some(work_dir.to_path_buf());
        state.reopen(phase);
        state.begin_phase(phase, crew.ids());
        self.store.save(&mut state)?;
        info!(phase = %phase, work_dir = %work_dir.display(), sessions = ?state.active_session_ids, "phase started");

        Ok(PhaseRun {
            phase,
            state,
            layout,
            log,
            crew,
        })
    }

    /// Tears the phase down on every path.
    ///
    /// Sessions are stopped first. On error the phase marker is still
    /// cleared and saved so the pipeline is not left stuck, then the error
    /// is returned.
    pub(crate) async fn close_phase(
        &self,
        mut run: PhaseRun,
        outcome: Result<PhaseReport>,
    ) -> Result<PhaseReport> {
        run.crew.shutdown().await;
        run.state.end_phase();

        match outcome {
            Ok(report) => {
                self.store.save(&mut run.state)?;
                info!(phase = %run.phase, success = report.success, "phase finished");
                Ok(report)
            }
            Err(e) => {
                error!(phase = %run.phase, error = %e, "phase aborted");
                if let Err(save_err) = self.store.save(&mut run.state) {
                    warn!(error = %save_err, "failed to save state after abort");
                }
                Err(e)
            }
        }
    }
}
