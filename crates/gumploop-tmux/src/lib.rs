//! Tmux, terminal and window plumbing for gumploop.
//!
//! This crate hosts every process-level concern of an agent session:
//! - Create and kill tmux sessions, capture their panes
//! - Deliver text through named paste buffers
//! - Open sessions inside a terminal emulator window (or headless)
//! - Track spawned terminal processes so they can be force-killed
//! - Choose an empty window-manager workspace for new windows
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use gumploop_tmux::{SessionLauncher, TerminalEmulator, TmuxOrchestrator};
//!
//! let tmux = TmuxOrchestrator::new().expect("tmux not found");
//! let launcher = SessionLauncher::new(tmux.clone(), TerminalEmulator::Headless);
//! launcher
//!     .launch("gumploop-claude-demo", Path::new("/tmp"), "claude", &[])
//!     .unwrap();
//!
//! let screen = tmux.capture_output("gumploop-claude-demo", Some(20)).unwrap();
//! println!("{}", screen);
//! tmux.kill_session("gumploop-claude-demo").unwrap();
//! ```

pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod session;
pub mod terminal;
pub mod window;

pub use error::{Result, TmuxError};
pub use orchestrator::TmuxOrchestrator;
pub use registry::ProcessRegistry;
pub use session::TmuxSession;
pub use terminal::{SessionLauncher, TerminalEmulator};
pub use window::{Placement, PlacementTarget, WindowManager, WindowNode};
