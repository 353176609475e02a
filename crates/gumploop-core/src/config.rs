//! Shared configuration for gumploop.
//!
//! Provides functions to locate gumploop's global state directory, the
//! per-project artifact directory and the environment-driven settings.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.gumploop/
//! ├── state.json    # Global fallback copy of the last saved pipeline state
//! └── sandbox/      # Default working directory when validation fails
//!
//! <project>/.gumploop/
//! ├── .state.json   # Project-scoped pipeline state
//! ├── progress.jsonl
//! ├── plan.md, review-<agent>.md, code-review.md, ...
//! ```
//!
//! # Environment Variables
//!
//! - `GUMPLOOP_STATE_DIR`: Override the global state directory
//! - `GUMPLOOP_TERMINAL`: Terminal emulator to open sessions in (`none` for headless)
//! - `GUMPLOOP_WM`: Window manager used for placement (`sway`, `i3`)
//! - `GUMPLOOP_CLAUDE_BIN`, `GUMPLOOP_GEMINI_BIN`, `GUMPLOOP_CODEX_BIN`: Agent binaries

use std::path::{Path, PathBuf};

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "GUMPLOOP_STATE_DIR";

/// Environment variable selecting the terminal emulator.
pub const TERMINAL_ENV: &str = "GUMPLOOP_TERMINAL";

/// Environment variable selecting the window manager.
pub const WM_ENV: &str = "GUMPLOOP_WM";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".gumploop";

/// Per-project artifact directory name.
pub const PROJECT_SUBDIR: &str = ".gumploop";

const GLOBAL_STATE_FILE: &str = "state.json";
const SANDBOX_SUBDIR: &str = "sandbox";

/// Get the global gumploop state directory.
///
/// The state directory is determined by:
/// 1. `GUMPLOOP_STATE_DIR` environment variable if set
/// 2. `~/.gumploop` if home directory is available
/// 3. `.gumploop` in current directory as fallback
pub fn state_dir() -> PathBuf {
    std::env::var(STATE_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(DEFAULT_STATE_DIR))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
        })
}

/// Get the global fallback state file path.
pub fn global_state_file() -> PathBuf {
    state_dir().join(GLOBAL_STATE_FILE)
}

/// Get the default sandbox directory used when a working directory is rejected.
pub fn sandbox_dir() -> PathBuf {
    state_dir().join(SANDBOX_SUBDIR)
}

/// Get the artifact directory for a project.
pub fn project_dir(work_dir: &Path) -> PathBuf {
    work_dir.join(PROJECT_SUBDIR)
}

/// Raw terminal emulator setting, if any.
pub fn terminal_setting() -> Option<String> {
    non_empty_env(TERMINAL_ENV)
}

/// Raw window manager setting, if any.
pub fn window_manager_setting() -> Option<String> {
    non_empty_env(WM_ENV)
}

/// Resolve the binary for an agent, honoring `GUMPLOOP_<AGENT>_BIN`.
pub fn agent_binary(agent_name: &str, default: &str) -> String {
    let var = format!("GUMPLOOP_{}_BIN", agent_name.to_ascii_uppercase());
    non_empty_env(&var).unwrap_or_else(|| default.to_string())
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
