//! Error types for lbrs-fs

use std::path::PathBuf;

/// Result type for lbrs-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lbrs-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The destination of a large copy already exists and could not be
    /// removed. Overwriting in place risks a truncated archive, so the
    /// caller must treat this as fatal.
    #[error("Destination {path} exists and could not be removed before copy")]
    UnremovableDestination { path: PathBuf },

    #[error("Timestamp verification failed for {path}: expected {expected}, found {found}")]
    StampMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
