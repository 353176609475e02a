//! Registry of spawned terminal processes.

use std::collections::HashMap;
use std::process::Child;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

/// Terminal child processes keyed by session name.
///
/// Killing through the registry makes sure no orphaned window survives
/// a failed phase.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    children: Mutex<HashMap<String, Child>>,
}

impl ProcessRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Child>> {
        self.children.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records the process hosting `session`.
    pub fn register(&self, session: &str, child: Child) {
        debug!(session = %session, pid = child.id(), "registering terminal process");
        if let Some(mut old) = self.lock().insert(session.to_string(), child) {
            let _ = old.kill();
        }
    }

    /// Force-kills and forgets the process for `session`.
    ///
    /// Returns false if nothing was registered under that name.
    pub fn kill(&self, session: &str) -> bool {
        let Some(mut child) = self.lock().remove(session) else {
            return false;
        };
        match child.kill() {
            Ok(()) => {
                let _ = child.wait();
            }
            // Already exited.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {}
            Err(e) => warn!(session = %session, error = %e, "failed to kill terminal process"),
        }
        true
    }

    /// Kills every registered process, returning the session names.
    pub fn kill_all(&self) -> Vec<String> {
        let names = self.names();
        for name in &names {
            self.kill(name);
        }
        names
    }

    /// Registered session names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered processes.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
