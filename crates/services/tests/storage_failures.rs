use std::sync::Arc;

use async_trait::async_trait;
use learn_core::LearnerState;
use learn_core::model::{CourseId, LessonId, ModuleId};
use learn_core::time::fixed_now;
use services::{
    Clock, LearningError, LearningService, MemoryNotifier, QuizService, QuizServiceError,
};
use storage::{KeyValueStore, LearnerStore, Storage, StorageError};

const CATALOG: &str = "\
course_id,course_title,module_id,module_title,module_order,lesson_id,lesson_title,lesson_order,quiz_questions
c1,Rust Basics,m1,Ownership,1,l1,Moves,1,What is 2+2?|4|3|5
c1,Rust Basics,m2,Traits,2,l2,Generics,1,
";

/// Reads nothing and refuses every write.
struct ReadOnlyStore;

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("read-only".into()))
    }

    async fn put_all(&self, _entries: &[(&str, String)]) -> Result<(), StorageError> {
        Err(StorageError::Connection("read-only".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("read-only".into()))
    }
}

fn read_only_store() -> LearnerStore {
    LearnerStore::new(Arc::new(ReadOnlyStore))
}

async fn imported() -> LearnerState {
    let storage = Storage::in_memory();
    let learning = LearningService::new(storage.learner_store(), Arc::new(MemoryNotifier::new()));
    let mut state = learning.load().await;
    learning
        .import_csv(&mut state, CATALOG, &mut |_| {})
        .await
        .unwrap();
    state
}

#[tokio::test]
async fn completion_that_cannot_be_saved_is_not_applied() {
    let mut state = imported().await;
    let before = state.clone();
    let learning = LearningService::new(read_only_store(), Arc::new(MemoryNotifier::new()));

    let err = learning
        .complete_lesson(&mut state, &LessonId::new("l1"))
        .await
        .unwrap_err();
    assert!(matches!(err, LearningError::Storage(_)));
    assert_eq!(state, before);
}

#[tokio::test]
async fn quiz_attempt_that_cannot_be_saved_is_not_counted() {
    let mut state = imported().await;
    state.complete_lesson(&LessonId::new("l1")).unwrap();
    let before = state.clone();
    let quizzes = QuizService::new(
        Clock::fixed(fixed_now()),
        read_only_store(),
        Arc::new(MemoryNotifier::new()),
    );

    let err = quizzes
        .start_quiz(&mut state, &CourseId::new("c1"), &ModuleId::new("m1"))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizServiceError::Storage(_)));
    assert_eq!(state, before);
    assert_eq!(
        state
            .quiz(&CourseId::new("c1"), &ModuleId::new("m1"))
            .unwrap()
            .attempts,
        0
    );
}
