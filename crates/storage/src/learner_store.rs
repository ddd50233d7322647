//! Persists the course hierarchy, quiz attempt counters and completion record
//! under three separate keys.
//!
//! Reads never fail: a missing or unreadable key falls back to its empty
//! default so the application always starts in a valid state.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;

use learn_core::model::{CompletionRecord, Course, QuizAttempts};

use crate::repository::{KeyValueStore, StorageError};

pub const COURSES_KEY: &str = "lms.courses";
pub const QUIZ_ATTEMPTS_KEY: &str = "lms.quiz_attempts";
pub const COMPLETION_KEY: &str = "lms.completion";

/// Why a persisted value could not be read. Logged, never returned by `load`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceReadError {
    #[error("store unavailable: {0}")]
    Unavailable(#[from] StorageError),

    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Everything `LearnerStore` persists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnerSnapshot {
    pub courses: Vec<Course>,
    pub quiz_attempts: QuizAttempts,
    pub completion: CompletionRecord,
}

#[derive(Clone)]
pub struct LearnerStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LearnerStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Write all three values in one batch.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the write fails. Nothing is
    /// written unless every value serialized.
    pub async fn save(
        &self,
        courses: &[Course],
        quiz_attempts: &QuizAttempts,
        completion: &CompletionRecord,
    ) -> Result<(), StorageError> {
        let entries = [
            (COURSES_KEY, to_json(courses)?),
            (QUIZ_ATTEMPTS_KEY, to_json(quiz_attempts)?),
            (COMPLETION_KEY, to_json(completion)?),
        ];
        self.kv.put_all(&entries).await?;
        tracing::debug!(courses = courses.len(), "learner state saved");
        Ok(())
    }

    /// Read all three values, substituting defaults for anything unreadable.
    pub async fn load(&self) -> LearnerSnapshot {
        LearnerSnapshot {
            courses: self.read_or_default(COURSES_KEY).await,
            quiz_attempts: self.read_or_default(QUIZ_ATTEMPTS_KEY).await,
            completion: self.read_or_default(COMPLETION_KEY).await,
        }
    }

    /// Remove all persisted learner state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if a key cannot be removed.
    pub async fn clear(&self) -> Result<(), StorageError> {
        for key in [COURSES_KEY, QUIZ_ATTEMPTS_KEY, COMPLETION_KEY] {
            self.kv.remove(key).await?;
        }
        tracing::info!("learner state cleared");
        Ok(())
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistenceReadError> {
        let Some(raw) = self.kv.get(key).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.read(key).await {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(err) => {
                tracing::warn!(key, error = %err, "falling back to empty value");
                T::default()
            }
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))
}
