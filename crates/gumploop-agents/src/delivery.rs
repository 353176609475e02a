//! Pasting messages into a session through a private temp file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use gumploop_tmux::TmuxOrchestrator;

use crate::error::{AgentError, Result};

/// Pause between pasting and submitting so the CLI finishes ingesting.
const SUBMIT_DELAY: Duration = Duration::from_millis(300);

const MESSAGE_FILE: &str = "message.txt";

/// Writes `text` into a new file readable only by the current user.
fn write_private(path: &Path, text: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(text.as_bytes())?;
    file.sync_all()
}

/// Pastes `text` into `session` as one bracketed paste and submits it.
///
/// The message is staged in a fresh private directory which is removed
/// whether or not the paste succeeded.
pub async fn deliver(tmux: &TmuxOrchestrator, session: &str, text: &str) -> Result<()> {
    let staging = |source| AgentError::Delivery {
        session: session.to_string(),
        source,
    };
    let dir = tempfile::Builder::new()
        .prefix("gumploop-msg-")
        .tempdir()
        .map_err(staging)?;
    let path = dir.path().join(MESSAGE_FILE);
    write_private(&path, text).map_err(staging)?;

    let buffer = format!("{}-msg", session);
    let pasted = tmux.paste_file(session, &buffer, &path);
    if let Err(e) = dir.close() {
        warn!(session = %session, error = %e, "failed to remove message staging dir");
    }
    pasted?;

    tokio::time::sleep(SUBMIT_DELAY).await;
    tmux.send_enter(session)?;
    debug!(session = %session, bytes = text.len(), "message delivered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_private_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MESSAGE_FILE);
        write_private(&path, "first").unwrap();
        assert!(write_private(&path, "second").is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_private_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MESSAGE_FILE);
        write_private(&path, "secret").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
