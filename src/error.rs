// src/error.rs

use chrono::NaiveDate;
use thiserror::Error;

/// Failures raised by a [`Store`](crate::store::Store) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The host context that owned the store handle is gone. Callers should
    /// reload and retry rather than treat this as a transient write failure.
    #[error("storage context invalidated, reload and retry")]
    ContextInvalidated,
    #[error("stored value under `{key}` is malformed: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode value for `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Input rejected before anything in the repository was touched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no problem id could be extracted")]
    MissingProblemId,
    #[error("problem title is empty")]
    EmptyTitle,
    #[error("at least one review date is required")]
    EmptySchedule,
    #[error("unknown schedule preset `{0}`")]
    UnknownPreset(String),
    #[error("repetition {index} is out of range ({len} repetitions)")]
    RepetitionOutOfRange { index: usize, len: usize },
    #[error("problem \"{title}\" already exists")]
    DuplicateProblem { id: String, title: String },
    #[error("repetition on {0} is already completed and cannot be moved")]
    CompletedRepetitionLocked(NaiveDate),
    #[error("preset `{0}` has a non-positive interval")]
    InvalidInterval(String),
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("schedule session is already closed")]
    SessionClosed,
    #[error("scheduler state lock poisoned")]
    StatePoisoned,
}

impl SchedulerError {
    pub fn is_context_invalidated(&self) -> bool {
        matches!(self, SchedulerError::Store(StoreError::ContextInvalidated))
    }

    /// Whether calling `persist()` again may succeed without redoing the edit.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SchedulerError::Store(StoreError::Unavailable(_)))
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
