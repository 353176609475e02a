//! Gumploop Core - shared configuration and validation.
//!
//! - **config**: State directory, project layout and environment variables
//! - **workdir**: Working-directory validation with sandbox fallback
//! - **text**: Terminal text helpers (ANSI stripping, tail extraction)

pub mod config;
pub mod error;
pub mod text;
pub mod workdir;

pub use config::{
    agent_binary, global_state_file, project_dir, sandbox_dir, state_dir, terminal_setting,
    window_manager_setting, PROJECT_SUBDIR,
};
pub use error::{CoreError, Result};
pub use text::{strip_ansi, tail_lines};
pub use workdir::{resolve_work_dir, validate_work_dir};
