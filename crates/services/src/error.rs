//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use companion_core::model::{QaRecordError, QuestionError, QuestionId};
use storage::StorageError;

/// Coarse classification shared by every service error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input: empty field, out-of-range score, unknown difficulty.
    Validation,
    /// Unknown topic or question.
    NotFound,
    /// The backing file stayed locked past the configured timeout.
    ConcurrencyTimeout,
    /// The backing file is unreadable, unwritable or corrupt.
    Persistence,
}

fn storage_kind(e: &StorageError) -> ErrorKind {
    if e.is_lock_timeout() {
        ErrorKind::ConcurrencyTimeout
    } else {
        ErrorKind::Persistence
    }
}

/// Errors emitted by `KnowledgeStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KnowledgeError {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error("topic {topic:?} not found")]
    TopicNotFound { topic: String },
    #[error("question {id} not found in topic {topic:?}")]
    QuestionNotFound { topic: String, id: QuestionId },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl KnowledgeError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            KnowledgeError::Question(_) => ErrorKind::Validation,
            KnowledgeError::TopicNotFound { .. } | KnowledgeError::QuestionNotFound { .. } => {
                ErrorKind::NotFound
            }
            KnowledgeError::Storage(e) => storage_kind(e),
        }
    }
}

/// Errors emitted by `ProgressTracker`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Record(#[from] QaRecordError),
    #[error("days ahead must be non-negative, got {days}")]
    InvalidHorizon { days: i64 },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ProgressError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProgressError::Record(_) | ProgressError::InvalidHorizon { .. } => {
                ErrorKind::Validation
            }
            ProgressError::Storage(e) => storage_kind(e),
        }
    }
}

/// Errors emitted by `ModeCoordinator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoordinatorError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CoordinatorError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoordinatorError::Storage(e) => storage_kind(e),
        }
    }
}

/// Errors emitted while building configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {raw:?}")]
    InvalidNumber { var: &'static str, raw: String },
    #[error("similarity threshold must be in [0, 1], got {0}")]
    InvalidThreshold(f64),
    #[error("student name cannot be empty")]
    EmptyStudentName,
    #[error("failed to create data directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
