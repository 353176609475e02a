//! Tmux orchestrator for agent sessions.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, trace, warn};

use crate::{Result, TmuxError, TmuxSession};

/// Stderr fragments tmux prints when the target is already gone.
const GONE_MARKERS: &[&str] = &["can't find session", "no server running", "session not found"];

fn is_gone(stderr: &str) -> bool {
    GONE_MARKERS.iter().any(|m| stderr.contains(m))
}

/// Builds the argument list for `tmux new-session` running `program`.
///
/// `detached` adds `-d` (headless mode); otherwise the caller runs the
/// command inside a terminal emulator which becomes the attached client.
pub fn new_session_args(
    name: &str,
    cwd: &Path,
    program: &str,
    args: &[String],
    detached: bool,
) -> Vec<String> {
    let mut argv = vec!["new-session".to_string()];
    if detached {
        argv.push("-d".to_string());
    }
    argv.extend([
        "-s".to_string(),
        name.to_string(),
        "-c".to_string(),
        cwd.display().to_string(),
        "-x".to_string(),
        "220".to_string(),
        "-y".to_string(),
        "50".to_string(),
        "--".to_string(),
        program.to_string(),
    ]);
    argv.extend(args.iter().cloned());
    argv
}

/// Drives tmux sessions hosting the agents.
#[derive(Debug, Clone)]
pub struct TmuxOrchestrator {
    /// Path to tmux binary.
    tmux_path: PathBuf,
}

impl TmuxOrchestrator {
    /// Create a new TmuxOrchestrator.
    ///
    /// # Errors
    ///
    /// Returns `TmuxError::NotFound` if tmux is not available.
    pub fn new() -> Result<Self> {
        let tmux_path = which::which("tmux").map_err(|_| TmuxError::NotFound)?;
        debug!(path = %tmux_path.display(), "tmux found");
        Ok(Self { tmux_path })
    }

    /// Uses an explicit tmux binary instead of searching PATH.
    pub fn with_path(tmux_path: impl Into<PathBuf>) -> Self {
        Self {
            tmux_path: tmux_path.into(),
        }
    }

    /// Path to the tmux binary.
    pub fn tmux_path(&self) -> &Path {
        &self.tmux_path
    }

    fn run_tmux(&self, args: &[&str]) -> Result<Output> {
        trace!(args = ?args, "running tmux command");
        let output = Command::new(&self.tmux_path).args(args).output()?;
        trace!(
            status = %output.status,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "tmux command completed"
        );
        Ok(output)
    }

    /// Runs a tmux command against `session`, mapping a vanished target to
    /// `SessionNotFound`.
    fn run_on_session(&self, session: &str, args: &[&str]) -> Result<String> {
        let output = self.run_tmux(args)?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).to_string());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if is_gone(&stderr) {
            Err(TmuxError::SessionNotFound(session.to_string()))
        } else {
            Err(TmuxError::CommandFailed(stderr))
        }
    }

    // ==================== Session Management ====================

    /// Create a detached session running `program` in `cwd`.
    pub fn create_detached_session(
        &self,
        name: &str,
        cwd: &Path,
        program: &str,
        args: &[String],
    ) -> Result<()> {
        debug!(name = %name, cwd = %cwd.display(), program = %program, "creating detached session");
        let argv = new_session_args(name, cwd, program, args, true);
        let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
        self.run_on_session(name, &argv)?;
        Ok(())
    }

    /// Kill a session.
    ///
    /// Returns `Ok(false)` if the session was already gone.
    pub fn kill_session(&self, name: &str) -> Result<bool> {
        debug!(name = %name, "killing tmux session");
        match self.run_on_session(name, &["kill-session", "-t", name]) {
            Ok(_) => Ok(true),
            Err(TmuxError::SessionNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// List all tmux sessions.
    pub fn list_sessions(&self) -> Result<Vec<TmuxSession>> {
        let output = self.run_tmux(&["list-sessions", "-F", TmuxSession::LIST_FORMAT])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // No server means no sessions.
            if is_gone(&stderr) || stderr.contains("no sessions") {
                return Ok(Vec::new());
            }
            return Err(TmuxError::CommandFailed(stderr.to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut sessions = Vec::new();
        for line in stdout.lines().filter(|l| !l.is_empty()) {
            match TmuxSession::parse(line) {
                Ok(session) => sessions.push(session),
                Err(e) => warn!(line = %line, error = %e, "failed to parse session"),
            }
        }
        Ok(sessions)
    }

    /// Check if a session exists.
    pub fn session_exists(&self, name: &str) -> bool {
        let output = self.run_tmux(&["has-session", "-t", name]);
        matches!(output, Ok(o) if o.status.success())
    }

    // ==================== I/O Operations ====================

    /// Capture the visible pane of a session.
    ///
    /// `lines` extends the capture into the scrollback by that many lines.
    pub fn capture_output(&self, session: &str, lines: Option<u32>) -> Result<String> {
        let start;
        let mut args = vec!["capture-pane", "-p", "-t", session];
        if let Some(n) = lines {
            start = format!("-{}", n);
            args.push("-S");
            args.push(&start);
        }
        self.run_on_session(session, &args)
    }

    /// Paste the contents of `file` into a session through a named buffer.
    ///
    /// The buffer is deleted after pasting. Bracketed paste keeps embedded
    /// newlines from submitting the input early.
    pub fn paste_file(&self, session: &str, buffer: &str, file: &Path) -> Result<()> {
        debug!(session = %session, buffer = %buffer, "pasting buffer");
        let file = file.display().to_string();
        self.run_on_session(session, &["load-buffer", "-b", buffer, &file])?;
        self.run_on_session(session, &["paste-buffer", "-p", "-d", "-b", buffer, "-t", session])?;
        Ok(())
    }

    /// Send keys to a session (special names like `Enter` are allowed).
    pub fn send_keys(&self, session: &str, keys: &str) -> Result<()> {
        debug!(session = %session, keys = %keys, "sending keys");
        self.run_on_session(session, &["send-keys", "-t", session, keys])?;
        Ok(())
    }

    /// Submit whatever is in the session's input line.
    pub fn send_enter(&self, session: &str) -> Result<()> {
        self.send_keys(session, "Enter")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_gone() {
        assert!(is_gone("can't find session: gumploop-claude-x"));
        assert!(is_gone("no server running on /tmp/tmux-1000/default"));
        assert!(!is_gone("unknown option -- z"));
    }

    #[test]
    fn test_new_session_args_detached() {
        let args = new_session_args(
            "gumploop-codex-1",
            Path::new("/work/app"),
            "codex",
            &["--full-auto".to_string()],
            true,
        );
        assert_eq!(args[0], "new-session");
        assert_eq!(args[1], "-d");
        let sep = args.iter().position(|a| a == "--").unwrap();
        assert_eq!(&args[sep + 1..], &["codex", "--full-auto"]);
        assert!(args.windows(2).any(|w| w == ["-c", "/work/app"]));
    }

    #[test]
    fn test_new_session_args_attached() {
        let args = new_session_args("s", Path::new("/w"), "claude", &[], false);
        assert!(!args.contains(&"-d".to_string()));
        assert_eq!(args.last().unwrap(), "claude");
    }

    #[test]
    fn test_new_when_tmux_not_found() {
        // Either succeeds (tmux installed) or returns NotFound.
        if let Err(e) = TmuxOrchestrator::new() {
            assert!(matches!(e, TmuxError::NotFound));
        }
    }

    // Integration tests that require actual tmux
    #[test]
    #[ignore]
    fn test_create_capture_kill() {
        let tmux = TmuxOrchestrator::new().unwrap();
        let name = "gumploop-test-lifecycle";
        let _ = tmux.kill_session(name);

        tmux.create_detached_session(name, Path::new("/tmp"), "cat", &[])
            .unwrap();
        assert!(tmux.session_exists(name));

        tmux.send_keys(name, "hello").unwrap();
        tmux.send_enter(name).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(200));
        let output = tmux.capture_output(name, Some(10)).unwrap();
        assert!(output.contains("hello"));

        assert!(tmux.kill_session(name).unwrap());
        assert!(!tmux.kill_session(name).unwrap());
    }

    #[test]
    #[ignore]
    fn test_paste_file() {
        let tmux = TmuxOrchestrator::new().unwrap();
        let name = "gumploop-test-paste";
        let _ = tmux.kill_session(name);
        tmux.create_detached_session(name, Path::new("/tmp"), "cat", &[])
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("msg.txt");
        std::fs::write(&file, "pasted text").unwrap();
        tmux.paste_file(name, "gumploop-test-buf", &file).unwrap();
        tmux.send_enter(name).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(200));

        let output = tmux.capture_output(name, None).unwrap();
        assert!(output.contains("pasted text"));
        tmux.kill_session(name).unwrap();
    }

    #[test]
    #[ignore]
    fn test_capture_nonexistent_session() {
        let tmux = TmuxOrchestrator::new().unwrap();
        let result = tmux.capture_output("gumploop-does-not-exist-12345", None);
        assert!(matches!(result, Err(TmuxError::SessionNotFound(_))));
    }
}
