//! I/O error types for the block file layer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for block file operations.
pub type IoResult<T> = std::result::Result<T, IoError>;

/// Errors that can occur during block file I/O.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum IoError {
    /// Standard I/O error.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// File not found.
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    /// Permission denied.
    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// File already exists.
    #[error("file already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// Short read/write (less data than expected).
    #[error("short {operation}: expected {expected} bytes, got {actual}")]
    ShortIo {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Invalid operation for file mode.
    #[error("invalid operation: {operation} not allowed in {mode} mode")]
    InvalidOperation {
        operation: &'static str,
        mode: &'static str,
    },

    /// Background I/O task failed to complete.
    #[error("I/O task failed: {message}")]
    TaskFailed { message: String },
}

impl IoError {
    /// Creates a ShortIo error for reads.
    pub fn short_read(expected: usize, actual: usize) -> Self {
        Self::ShortIo {
            operation: "read",
            expected,
            actual,
        }
    }

    /// Creates a ShortIo error for writes.
    pub fn short_write(expected: usize, actual: usize) -> Self {
        Self::ShortIo {
            operation: "write",
            expected,
            actual,
        }
    }

    /// Returns true if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
            || matches!(self, Self::Io { source } if source.kind() == io::ErrorKind::NotFound)
    }

    /// Converts from `std::io::Error` with path context.
    pub fn from_io_with_path(err: io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            io::ErrorKind::AlreadyExists => Self::AlreadyExists { path },
            _ => Self::Io { source: err },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_io() {
        let err = IoError::short_write(4096, 512);
        assert!(matches!(
            err,
            IoError::ShortIo {
                operation: "write",
                expected: 4096,
                actual: 512
            }
        ));
    }

    #[test]
    fn test_from_io_with_path() {
        let err = IoError::from_io_with_path(
            io::Error::new(io::ErrorKind::NotFound, "missing"),
            "/tmp/silt.store",
        );
        assert!(err.is_not_found());

        let err = IoError::from_io_with_path(
            io::Error::new(io::ErrorKind::AlreadyExists, "exists"),
            "/tmp/silt.store",
        );
        assert!(matches!(err, IoError::AlreadyExists { .. }));
    }
}
