//! Shared error types for the services crate.

use thiserror::Error;

use learn_core::{AccessError, LockedError, LookupError};
use learn_core::import::ImportError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::quiz::QuizSessionError;

/// Errors emitted by `LearningService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LearningError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Locked(#[from] LockedError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<AccessError> for LearningError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Lookup(err) => Self::Lookup(err),
            AccessError::Locked(err) => Self::Locked(err),
        }
    }
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Session(#[from] QuizSessionError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Locked(#[from] LockedError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<AccessError> for QuizServiceError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Lookup(err) => Self::Lookup(err),
            AccessError::Locked(err) => Self::Locked(err),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
