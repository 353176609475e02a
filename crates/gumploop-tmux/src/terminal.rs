//! Terminal emulator selection and launching.
//!
//! Each agent session is a tmux session; when a terminal emulator is
//! configured the session is created attached inside a new window so the
//! user can watch the agents work.

use std::fmt;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::str::FromStr;

use tracing::{debug, info, warn};

use gumploop_core::config::terminal_setting;

use crate::orchestrator::{new_session_args, TmuxOrchestrator};
use crate::{Result, TmuxError};

/// Supported terminal emulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalEmulator {
    /// No window; sessions are created detached.
    Headless,
    Alacritty,
    Kitty,
    Foot,
    GnomeTerminal,
    Konsole,
    Wezterm,
    Xterm,
}

impl TerminalEmulator {
    /// Picks the emulator from `GUMPLOOP_TERMINAL`.
    ///
    /// Without the variable, a graphical session gets alacritty and
    /// anything else runs headless.
    pub fn from_env() -> Self {
        if let Some(setting) = terminal_setting() {
            return setting.parse().unwrap_or_else(|e: String| {
                warn!(setting = %setting, error = %e, "unknown terminal, running headless");
                TerminalEmulator::Headless
            });
        }
        let graphical =
            std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some();
        if graphical {
            TerminalEmulator::Alacritty
        } else {
            TerminalEmulator::Headless
        }
    }

    /// Binary name of the emulator.
    pub fn binary(&self) -> Option<&'static str> {
        match self {
            TerminalEmulator::Headless => None,
            TerminalEmulator::Alacritty => Some("alacritty"),
            TerminalEmulator::Kitty => Some("kitty"),
            TerminalEmulator::Foot => Some("foot"),
            TerminalEmulator::GnomeTerminal => Some("gnome-terminal"),
            TerminalEmulator::Konsole => Some("konsole"),
            TerminalEmulator::Wezterm => Some("wezterm"),
            TerminalEmulator::Xterm => Some("xterm"),
        }
    }

    /// Arguments placed before the command the window should run.
    fn exec_args(&self, title: &str) -> Vec<String> {
        let v = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        match self {
            TerminalEmulator::Headless => Vec::new(),
            TerminalEmulator::Alacritty => v(&["--title", title, "-e"]),
            TerminalEmulator::Kitty => v(&["--title", title]),
            TerminalEmulator::Foot => v(&["--title", title]),
            TerminalEmulator::GnomeTerminal => v(&["--title", title, "--"]),
            TerminalEmulator::Konsole => v(&["-p", &format!("tabtitle={}", title), "-e"]),
            TerminalEmulator::Wezterm => v(&["start", "--"]),
            TerminalEmulator::Xterm => v(&["-T", title, "-e"]),
        }
    }

    /// Full argv (emulator first) for a window running tmux with the agent.
    pub fn window_argv(
        &self,
        tmux: &Path,
        session: &str,
        cwd: &Path,
        program: &str,
        args: &[String],
    ) -> Option<Vec<String>> {
        let binary = self.binary()?;
        let mut argv = vec![binary.to_string()];
        argv.extend(self.exec_args(session));
        argv.push(tmux.display().to_string());
        argv.extend(new_session_args(session, cwd, program, args, false));
        Some(argv)
    }
}

impl fmt::Display for TerminalEmulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary().unwrap_or("none"))
    }
}

impl FromStr for TerminalEmulator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "headless" => Ok(TerminalEmulator::Headless),
            "alacritty" => Ok(TerminalEmulator::Alacritty),
            "kitty" => Ok(TerminalEmulator::Kitty),
            "foot" => Ok(TerminalEmulator::Foot),
            "gnome-terminal" => Ok(TerminalEmulator::GnomeTerminal),
            "konsole" => Ok(TerminalEmulator::Konsole),
            "wezterm" => Ok(TerminalEmulator::Wezterm),
            "xterm" => Ok(TerminalEmulator::Xterm),
            other => Err(format!("unsupported terminal: {}", other)),
        }
    }
}

/// Creates agent sessions, either headless or inside a terminal window.
#[derive(Debug, Clone)]
pub struct SessionLauncher {
    tmux: TmuxOrchestrator,
    terminal: TerminalEmulator,
}

impl SessionLauncher {
    /// Creates a launcher for the given emulator.
    pub fn new(tmux: TmuxOrchestrator, terminal: TerminalEmulator) -> Self {
        Self { tmux, terminal }
    }

    /// The tmux driver.
    pub fn tmux(&self) -> &TmuxOrchestrator {
        &self.tmux
    }

    /// The configured emulator.
    pub fn terminal(&self) -> TerminalEmulator {
        self.terminal
    }

    /// Launches `program` in a new session.
    ///
    /// Returns the terminal child process when a window was opened. The
    /// tmux session itself appears asynchronously in that case.
    pub fn launch(
        &self,
        session: &str,
        cwd: &Path,
        program: &str,
        args: &[String],
    ) -> Result<Option<Child>> {
        let Some(argv) = self
            .terminal
            .window_argv(self.tmux.tmux_path(), session, cwd, program, args)
        else {
            self.tmux.create_detached_session(session, cwd, program, args)?;
            return Ok(None);
        };

        debug!(argv = ?argv, "spawning terminal window");
        let child = Command::new(&argv[0])
            .args(&argv[1..])
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| TmuxError::TerminalLaunch {
                terminal: self.terminal.to_string(),
                source,
            })?;
        info!(session = %session, terminal = %self.terminal, pid = child.id(), "terminal launched");
        Ok(Some(child))
    }
}
