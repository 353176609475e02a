//! Working-directory validation.
//!
//! Agents run with permission prompts disabled, so the directory they are
//! pointed at must never be a system location.

use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::config::sandbox_dir;
use crate::error::{CoreError, Result};

/// Directories that are rejected along with everything below them.
const DENIED_TREES: &[&str] = &[
    "/bin",
    "/boot",
    "/dev",
    "/etc",
    "/lib",
    "/lib32",
    "/lib64",
    "/proc",
    "/sbin",
    "/sys",
    "/usr",
    "/System",
    "/Library",
    "/private/etc",
    "/private/var/db",
];

/// Directories rejected only as an exact match.
const DENIED_EXACT: &[&str] = &["/", "/home", "/Users", "/root", "/var", "/tmp", "/opt", "/private"];

fn is_denied(resolved: &Path) -> bool {
    DENIED_EXACT.iter().any(|d| resolved == Path::new(d))
        || DENIED_TREES.iter().any(|d| resolved.starts_with(d))
}

/// Validates a requested working directory and returns it resolved.
///
/// Rejects relative paths and `..` segments before touching the
/// filesystem, then canonicalizes and checks the deny-list.
///
/// # Errors
///
/// Returns the `CoreError` variant naming the first rule violated.
pub fn validate_work_dir(path: &Path) -> Result<PathBuf> {
    if !path.is_absolute() {
        return Err(CoreError::RelativePath(path.to_path_buf()));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(CoreError::PathTraversal(path.to_path_buf()));
    }
    // Check the literal path too, so a missing /etc/foo is still denied.
    if is_denied(path) {
        return Err(CoreError::DeniedDirectory(path.to_path_buf()));
    }

    let resolved = path.canonicalize().map_err(|source| CoreError::Resolve {
        path: path.to_path_buf(),
        source,
    })?;
    if is_denied(&resolved) {
        return Err(CoreError::DeniedDirectory(resolved));
    }
    if !resolved.is_dir() {
        return Err(CoreError::NotADirectory(resolved));
    }
    Ok(resolved)
}

/// Resolves an optional working directory, falling back to the sandbox.
///
/// The sandbox directory is created on demand.
pub fn resolve_work_dir(requested: Option<&Path>) -> PathBuf {
    if let Some(path) = requested {
        match validate_work_dir(path) {
            Ok(resolved) => return resolved,
            Err(e) => warn!(path = %path.display(), error = %e, "rejected working directory, using sandbox"),
        }
    }

    let sandbox = sandbox_dir();
    if let Err(e) = std::fs::create_dir_all(&sandbox) {
        warn!(path = %sandbox.display(), error = %e, "failed to create sandbox directory");
    }
    sandbox
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rejects_etc() {
        if Path::new("/etc").exists() {
            let result = validate_work_dir(Path::new("/etc"));
            assert!(matches!(result, Err(CoreError::DeniedDirectory(_))));
        }
    }

    #[test]
    fn test_rejects_below_denied_tree() {
        let result = validate_work_dir(Path::new("/usr/local/share"));
        assert!(matches!(result, Err(CoreError::DeniedDirectory(_))));
    }

    #[test]
    fn test_rejects_parent_segment_before_resolution() {
        let dir = tempdir().unwrap();
        let sneaky = dir.path().join("..").join(dir.path().file_name().unwrap());
        let result = validate_work_dir(&sneaky);
        assert!(matches!(result, Err(CoreError::PathTraversal(_))));
    }

    #[test]
    fn test_rejects_relative() {
        let result = validate_work_dir(Path::new("some/project"));
        assert!(matches!(result, Err(CoreError::RelativePath(_))));
    }

    #[test]
    fn test_rejects_root() {
        let result = validate_work_dir(Path::new("/"));
        assert!(matches!(result, Err(CoreError::DeniedDirectory(_))));
    }

    #[test]
    fn test_rejects_missing() {
        let dir = tempdir().unwrap();
        let result = validate_work_dir(&dir.path().join("missing"));
        assert!(matches!(result, Err(CoreError::Resolve { .. })));
    }

    #[test]
    fn test_accepts_existing_directory() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("project");
        std::fs::create_dir(&project).unwrap();

        let resolved = validate_work_dir(&project).unwrap();
        assert_eq!(resolved, project.canonicalize().unwrap());
    }

    #[test]
    fn test_rejects_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        let result = validate_work_dir(&file);
        assert!(matches!(result, Err(CoreError::NotADirectory(_))));
    }

    #[test]
    fn test_resolve_prefers_valid_request() {
        let dir = tempdir().unwrap();
        let resolved = resolve_work_dir(Some(dir.path()));
        assert_eq!(resolved, dir.path().canonicalize().unwrap());
    }
}
