//! Persistence layer for gumploop.
//!
//! This crate provides crash-safe persistence for the pipeline state using
//! atomic file operations (write to temp file, then rename), plus tolerant
//! readers for the files external agents write into a project.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use gumploop_persistence::{ProgressLog, StateStore};
//!
//! let store = StateStore::from_env();
//! let mut state = store.load(Some(Path::new("/work/app")));
//! state.task = "add dark mode".to_string();
//! store.save(&mut state).unwrap();
//!
//! let log = ProgressLog::for_project(Path::new("/work/app"));
//! let planned = log.contains("claude", "plan_written", 1);
//! ```

pub mod artifacts;
pub mod atomic;
pub mod error;
pub mod progress_log;
pub mod state_store;

pub use artifacts::{ArtifactRead, ProjectLayout, MIN_ARTIFACT_LEN};
pub use error::{PersistenceError, Result};
pub use progress_log::ProgressLog;
pub use state_store::{is_valid_state, StateStore};
