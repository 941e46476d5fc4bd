//! Error types for the storage layer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error.
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The key cannot be used as a file name.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// No saved object under this key.
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// A term file could not be turned into terms.
    #[error("invalid terms in {path}: {reason}")]
    InvalidTerms { path: PathBuf, reason: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
