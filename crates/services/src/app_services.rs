use std::sync::Arc;

use learn_core::model::CourseDefaults;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::learning_service::LearningService;
use crate::notify::Notifier;
use crate::quiz::QuizService;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    learning: Arc<LearningService>,
    quizzes: Arc<QuizService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        defaults: CourseDefaults,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, defaults, notifier))
    }

    /// Build services over a throwaway in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock, defaults: CourseDefaults, notifier: Arc<dyn Notifier>) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, defaults, notifier)
    }

    fn from_storage(
        storage: &Storage,
        clock: Clock,
        defaults: CourseDefaults,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store = storage.learner_store();
        let learning = Arc::new(
            LearningService::new(store.clone(), Arc::clone(&notifier)).with_defaults(defaults),
        );
        let quizzes = Arc::new(QuizService::new(clock, store, notifier));
        Self { learning, quizzes }
    }

    #[must_use]
    pub fn learning(&self) -> Arc<LearningService> {
        Arc::clone(&self.learning)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }
}
