//! Protocol error types

use std::path::PathBuf;
use thiserror::Error;

/// Protocol result type
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Job-file protocol errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Filesystem operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Expected protocol file was not present
    #[error("Missing {kind} file for job {id}")]
    MissingFile { kind: &'static str, id: u64 },

    /// Deletion kept failing after the bounded retries
    #[error("Cleanup of {path} failed after {attempts} attempts: {source}")]
    CleanupFailed {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
}

impl ProtocolError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
