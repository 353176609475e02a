//! Error types for core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by working-directory validation.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Path is not absolute.
    #[error("path must be absolute: {0}")]
    RelativePath(PathBuf),

    /// Path contains a `..` segment.
    #[error("path traversal is not allowed: {0}")]
    PathTraversal(PathBuf),

    /// Path resolves to a protected system directory.
    #[error("refusing to operate on system directory: {0}")]
    DeniedDirectory(PathBuf),

    /// Path does not exist or is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// I/O error while resolving a path.
    #[error("failed to resolve {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
