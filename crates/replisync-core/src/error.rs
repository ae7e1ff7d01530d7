//! Error types for synchronization.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reconciling or driving a sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The source root does not exist.
    #[error("Source folder '{}' does not exist", path.display())]
    SourceMissing { path: PathBuf },

    /// A root path exists but is not a directory.
    #[error("Not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// Permission denied for a path.
    #[error("Permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk failed.
    #[error("Walk error at {}: {message}", path.display())]
    Walk { path: PathBuf, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A background task failed to complete.
    #[error("Task failed: {message}")]
    Task { message: String },
}

impl SyncError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// The path the error refers to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::SourceMissing { path }
            | Self::NotADirectory { path }
            | Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::Io { path, .. }
            | Self::Walk { path, .. } => Some(path),
            Self::InvalidConfig { .. } | Self::Task { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_io() {
        let err = SyncError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, SyncError::PermissionDenied { .. }));

        let err = SyncError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, SyncError::NotFound { .. }));

        let err = SyncError::io("/test/path", std::io::Error::other("disk on fire"));
        assert!(matches!(err, SyncError::Io { .. }));
        assert!(err.to_string().contains("/test/path"));
    }

    #[test]
    fn test_source_missing_message() {
        let err = SyncError::SourceMissing {
            path: PathBuf::from("/nope"),
        };
        assert_eq!(err.to_string(), "Source folder '/nope' does not exist");
        assert_eq!(err.path(), Some(std::path::Path::new("/nope")));
    }
}
