//! Agent sessions for gumploop.
//!
//! An [`AgentSession`] wraps one interactive agent CLI running in tmux:
//! it starts the CLI, pastes tagged messages into it and waits for the
//! reply. Since none of the CLIs report completion, a reply is
//! recognized by the acknowledgment token the agent was asked to echo,
//! found in the agent's own transcript files.
//!
//! Every wait runs through [`poll::poll_until`], whose deadline keeps
//! extending as long as the agent's screen keeps changing.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use gumploop_agents::{AgentConfig, SessionEnv, SessionFactory, TmuxSessionFactory};
//! use gumploop_models::AgentKind;
//! use gumploop_tmux::{ProcessRegistry, SessionLauncher, TerminalEmulator, TmuxOrchestrator};
//!
//! # async fn run() -> gumploop_agents::Result<()> {
//! let env = SessionEnv {
//!     launcher: SessionLauncher::new(TmuxOrchestrator::new()?, TerminalEmulator::Headless),
//!     registry: Arc::new(ProcessRegistry::new()),
//!     placement: None,
//!     config: Arc::new(AgentConfig::default()),
//! };
//! let factory = TmuxSessionFactory::new(env);
//! let mut session = factory.create(AgentKind::Implementer, Path::new("/work/app"));
//! session.start().await?;
//! session.send_message("Summarize README.md").await?;
//! session.wait_for_completion().await?;
//! session.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod delivery;
pub mod detect;
pub mod error;
pub mod factory;
pub mod patterns;
pub mod poll;
pub mod prompt;
pub mod session;

pub use config::{AgentConfig, LaunchSpec, TranscriptRoots};
pub use error::{AgentError, Result};
pub use factory::{SessionFactory, TmuxSessionFactory};
pub use poll::{poll_until, AdaptiveDeadline, Probe, TimeoutPolicy};
pub use session::{
    AgentSession, ImplementerSession, SessionCore, SessionEnv, TechReviewerSession,
    UxReviewerSession,
};
