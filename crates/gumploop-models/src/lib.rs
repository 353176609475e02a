//! Core data models for gumploop.
//!
//! This crate provides the fundamental data types shared by every other
//! crate in the workspace: pipeline phases, agent kinds, the persisted
//! pipeline state, progress events and correlation tokens.

pub mod ids;
pub mod phase;
pub mod progress;
pub mod state;

pub use ids::{CorrelationToken, SessionId, TokenPair};
pub use phase::{AgentKind, Phase};
pub use progress::ProgressEvent;
pub use state::{PhaseFlags, PipelineState};
