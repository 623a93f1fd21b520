use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the JSON file backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt {kind} document at {}: {source}", path.display())]
    Corrupt {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} document at {} has schema version {found}, newest supported is {supported}", path.display())]
    UnsupportedVersion {
        kind: &'static str,
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("timed out after {waited:?} waiting for lock on {}", path.display())]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("failed to serialize {kind} document: {source}")]
    Serialization {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error is a lock acquisition timeout rather than a
    /// persistence failure.
    #[must_use]
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, StorageError::LockTimeout { .. })
    }
}
