use std::future::{ready, Future};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use gumploop_core::text::strip_ansi;
use gumploop_models::{AgentKind, SessionId, TokenPair};
use gumploop_persistence::ProgressLog;
use gumploop_tmux::TmuxOrchestrator;

use crate::config::{AgentConfig, LaunchSpec};
use crate::delivery::deliver;
use crate::detect::PendingRequest;
use crate::error::{AgentError, Result};
use crate::patterns::{first_match, ready_patterns};
use crate::poll::{poll_until, LivenessProbe, Probe, TimeoutPolicy};
use crate::prompt::wrap_message;

use super::SessionEnv;

/// State and behavior common to every agent session.
///
/// Dropping a running core tears the session down, so a panicking phase
/// still leaves no window behind.
#[derive(Debug)]
pub struct SessionCore {
    id: SessionId,
    kind: AgentKind,
    work_dir: PathBuf,
    env: SessionEnv,
    progress: ProgressLog,
    pending: Option<PendingRequest>,
    running: bool,
}

impl SessionCore {
    pub fn new(kind: AgentKind, work_dir: PathBuf, env: SessionEnv) -> Self {
        let progress = ProgressLog::for_project(&work_dir);
        Self {
            id: SessionId::new(kind),
            kind,
            work_dir,
            env,
            progress,
            pending: None,
            running: false,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn config(&self) -> &AgentConfig {
        &self.env.config
    }

    pub fn tmux(&self) -> &TmuxOrchestrator {
        self.env.launcher.tmux()
    }

    /// Launches the CLI, then waits for a ready indicator.
    ///
    /// A missing indicator is logged and otherwise ignored.
    pub async fn start(&mut self, launch: &LaunchSpec) -> Result<()> {
        if self.running {
            return Ok(());
        }
        if let Some(placement) = &self.env.placement {
            placement.apply();
        }
        info!(
            session = %self.id,
            agent = %self.kind,
            program = %launch.program,
            "starting agent session"
        );
        let child =
            self.env
                .launcher
                .launch(self.id.as_str(), &self.work_dir, &launch.program, &launch.args)?;
        if let Some(child) = child {
            self.env.registry.register(self.id.as_str(), child);
        }
        self.running = true;

        tokio::time::sleep(self.env.config.startup_grace).await;
        self.wait_until_ready().await;
        Ok(())
    }

    async fn wait_until_ready(&self) {
        let policy = TimeoutPolicy {
            base: self.env.config.ready_timeout,
            extension: Duration::ZERO,
            activity_threshold: Duration::ZERO,
            interval: self.env.config.ready_poll_interval,
        };
        let patterns = ready_patterns(self.kind);
        let tmux = self.tmux();
        let session = self.id.as_str();

        let outcome = poll_until(policy, || {
            let found = tmux
                .capture_output(session, None)
                .ok()
                .and_then(|screen| first_match(patterns, &strip_ansi(&screen)))
                .map(|p| p.name);
            ready(match found {
                Some(name) => Probe::done(name),
                None => Probe::pending(false),
            })
        })
        .await;

        match outcome {
            Ok(indicator) => info!(session = %self.id, indicator, "agent ready"),
            Err(t) => warn!(
                session = %self.id,
                waited = ?t.waited,
                "no ready indicator, proceeding anyway"
            ),
        }
    }

    /// Tags `text` with a fresh token pair and pastes it into the session.
    pub async fn send(&mut self, text: &str) -> Result<TokenPair> {
        if !self.running {
            return Err(AgentError::NotStarted(self.id.to_string()));
        }
        let tokens = TokenPair::generate();
        let message = wrap_message(self.kind, text, &tokens);
        // Start time is taken before delivery so a fast reply is not missed.
        let request = PendingRequest::new(tokens.clone());
        deliver(self.tmux(), self.id.as_str(), &message).await?;
        debug!(session = %self.id, request = %tokens.request, "request sent");
        self.pending = Some(request);
        Ok(tokens)
    }

    /// The outstanding request.
    pub fn pending(&self) -> Result<PendingRequest> {
        self.pending
            .clone()
            .ok_or_else(|| AgentError::NoOutstandingRequest(self.id.to_string()))
    }

    /// Marks the outstanding request as answered.
    pub fn finish_request(&mut self) {
        if let Some(request) = self.pending.take() {
            info!(session = %self.id, ack = %request.tokens.ack, "request completed");
        }
    }

    /// Polls `signal` under the adaptive deadline.
    ///
    /// Each cycle captures the pane once; the capture feeds the liveness
    /// probe and is handed to `signal` for screen-based detection.
    pub async fn await_signal<F, Fut>(&self, waiting_for: &str, mut signal: F) -> Result<()>
    where
        F: FnMut(&str) -> Fut + Send,
        Fut: Future<Output = bool> + Send,
    {
        let tmux = self.tmux();
        let session = self.id.as_str();
        let mut liveness = LivenessProbe::default();

        let outcome = poll_until(self.env.config.timeout_policy(), || {
            let snapshot = tmux.capture_output(session, None).unwrap_or_else(|e| {
                trace!(session = %session, error = %e, "capture failed");
                String::new()
            });
            let active = liveness.observe(&snapshot);
            let done = signal(&snapshot);
            async move {
                if done.await {
                    Probe::done(())
                } else {
                    Probe::pending(active)
                }
            }
        })
        .await;

        outcome.map_err(|t| {
            warn!(
                session = %self.id,
                waiting_for = %waiting_for,
                waited = ?t.waited,
                extensions = t.extensions,
                "wait timed out"
            );
            AgentError::Timeout {
                session: self.id.to_string(),
                waiting_for: waiting_for.to_string(),
                waited: t.waited,
            }
        })
    }

    /// Waits for a milestone in the project's progress log.
    pub async fn wait_for_progress(&self, agent: &str, action: &str, iteration: u32) -> Result<()> {
        let log = &self.progress;
        let what = format!("{}:{}#{}", agent, action, iteration);
        self.await_signal(&what, |_| ready(log.contains(agent, action, iteration)))
            .await?;
        debug!(session = %self.id, milestone = %what, "progress event observed");
        Ok(())
    }

    /// Kills the terminal process and the tmux session.
    ///
    /// "Already gone" is not an error; other failures are only logged.
    pub fn stop(&mut self) {
        self.pending = None;
        if !self.running {
            return;
        }
        self.running = false;
        match self.tmux().kill_session(self.id.as_str()) {
            Ok(true) => info!(session = %self.id, "agent session stopped"),
            Ok(false) => debug!(session = %self.id, "agent session already gone"),
            Err(e) => warn!(session = %self.id, error = %e, "failed to kill agent session"),
        }
        self.env.registry.kill(self.id.as_str());
    }
}

impl Drop for SessionCore {
    fn drop(&mut self) {
        self.stop();
    }
}
