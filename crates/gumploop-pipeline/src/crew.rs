//! The set of agent sessions owned by one phase run.

use std::path::Path;

use futures::future::try_join_all;
use tracing::{debug, warn};

use gumploop_agents::{AgentSession, SessionFactory};
use gumploop_models::AgentKind;

use crate::error::Result;

/// One message for one agent and the milestone that marks it done.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub kind: AgentKind,
    pub prompt: String,
    pub action: &'static str,
}

impl Assignment {
    pub fn new(kind: AgentKind, action: &'static str, prompt: String) -> Self {
        Self {
            kind,
            prompt,
            action,
        }
    }
}

/// Sessions created for a phase, stopped together when it ends.
pub struct Crew {
    sessions: Vec<Box<dyn AgentSession>>,
}

impl Crew {
    /// Creates (but does not start) one session per kind.
    pub fn assemble(factory: &dyn SessionFactory, kinds: &[AgentKind], work_dir: &Path) -> Self {
        let sessions = kinds
            .iter()
            .map(|kind| factory.create(*kind, work_dir))
            .collect();
        Self { sessions }
    }

    /// Session identifiers, in creation order.
    pub fn ids(&self) -> Vec<String> {
        self.sessions.iter().map(|s| s.id().to_string()).collect()
    }

    /// Starts every session concurrently.
    pub async fn start_all(&mut self) -> Result<()> {
        try_join_all(self.sessions.iter_mut().map(|s| s.start())).await?;
        Ok(())
    }

    /// Runs the assignments concurrently, one per matching session.
    ///
    /// Each assignment is sent, then awaited through its progress event and
    /// finally the end of the agent's turn. A missing acknowledgment after
    /// the milestone was seen is tolerated, since the work is on disk.
    pub async fn dispatch(&mut self, assignments: &[Assignment], iteration: u32) -> Result<()> {
        let jobs = self.sessions.iter_mut().filter_map(|session| {
            let assignment = assignments.iter().find(|a| a.kind == session.kind())?;
            Some(run_assignment(session.as_mut(), assignment, iteration))
        });
        try_join_all(jobs).await?;
        Ok(())
    }

    /// Convenience for a single assignment.
    pub async fn assign(
        &mut self,
        kind: AgentKind,
        action: &'static str,
        prompt: String,
        iteration: u32,
    ) -> Result<()> {
        self.dispatch(&[Assignment::new(kind, action, prompt)], iteration)
            .await
    }

    /// Stops every session. Never fails.
    pub async fn shutdown(&mut self) {
        for session in &mut self.sessions {
            session.stop().await;
        }
    }
}

async fn run_assignment(
    session: &mut dyn AgentSession,
    assignment: &Assignment,
    iteration: u32,
) -> Result<()> {
    let agent = assignment.kind.agent_name();
    debug!(
        session = %session.id(),
        action = assignment.action,
        iteration,
        "dispatching assignment"
    );
    session.send_message(&assignment.prompt).await?;
    session
        .wait_for_progress_event(agent, assignment.action, iteration)
        .await?;
    match session.wait_for_completion().await {
        Ok(()) => Ok(()),
        Err(e) if e.is_timeout() => {
            warn!(
                session = %session.id(),
                action = assignment.action,
                "milestone reached but reply never acknowledged"
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
