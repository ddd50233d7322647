use std::sync::Arc;

use learn_core::model::{CourseId, LessonId, ModuleId};
use learn_core::{LearnerState, LockedError, Selection, UnlockEvent};
use services::{LearningError, LearningService, MemoryNotifier, Severity};
use storage::repository::Storage;

const CATALOG: &str = "\
course_id,course_title,module_id,module_title,module_order,lesson_id,lesson_title,lesson_order,quiz_questions
c1,Rust Basics,m1,Ownership,1,l1,Moves,1,
c1,Rust Basics,m1,Ownership,1,l2,Borrows,2,
c1,Rust Basics,m2,Traits,2,l3,Generics,1,
c2,Async Rust,m3,Futures,1,l4,Polling,1,
";

fn service(storage: &Storage) -> (LearningService, MemoryNotifier) {
    let notifier = MemoryNotifier::new();
    let service = LearningService::new(storage.learner_store(), Arc::new(notifier.clone()));
    (service, notifier)
}

async fn imported(service: &LearningService) -> LearnerState {
    let mut state = service.load().await;
    service
        .import_csv(&mut state, CATALOG, &mut |_| {})
        .await
        .unwrap();
    state
}

#[tokio::test]
async fn import_builds_hierarchy_and_persists_it() {
    let storage = Storage::in_memory();
    let (service, notifier) = service(&storage);
    let mut state = service.load().await;
    assert!(state.is_empty());

    let mut reports = Vec::new();
    let summary = service
        .import_csv(&mut state, CATALOG, &mut |p| reports.push(p))
        .await
        .unwrap();

    assert_eq!(summary.courses, 2);
    assert_eq!(summary.modules, 3);
    assert_eq!(summary.lessons, 4);
    assert_eq!(summary.quizzes, 0);
    assert_eq!(summary.skipped_rows, 0);
    assert!(summary.unlocks.is_empty());
    assert_eq!(reports.last().map(|p| (p.processed, p.total)), Some((4, 4)));

    let c1 = state.course(&CourseId::new("c1")).unwrap();
    assert_eq!(c1.total_lessons, 3);
    assert!(!c1.is_locked);
    assert!(!c1.modules[0].is_locked);
    assert!(c1.modules[1].is_locked);
    assert!(state.course(&CourseId::new("c2")).unwrap().is_locked);

    assert_eq!(
        notifier.with_severity(Severity::Success),
        vec!["Imported 2 courses"]
    );

    let (reloaded_service, _) = self::service(&storage);
    let reloaded = reloaded_service.load().await;
    assert_eq!(reloaded.courses(), state.courses());
}

#[tokio::test]
async fn short_rows_are_skipped_and_reported() {
    let storage = Storage::in_memory();
    let (service, notifier) = service(&storage);
    let mut state = service.load().await;

    let csv = format!("{CATALOG}c1,Rust Basics,m1\n");
    let summary = service
        .import_csv(&mut state, &csv, &mut |_| {})
        .await
        .unwrap();

    assert_eq!(summary.skipped_rows, 1);
    assert_eq!(summary.lessons, 4);
    assert_eq!(
        notifier.with_severity(Severity::Warning),
        vec!["Skipped 1 malformed rows"]
    );
}

#[tokio::test]
async fn failed_import_leaves_previous_state_untouched() {
    let storage = Storage::in_memory();
    let (service, notifier) = service(&storage);
    let mut state = imported(&service).await;
    service
        .complete_lesson(&mut state, &LessonId::new("l1"))
        .await
        .unwrap();
    let before = state.clone();

    let err = service
        .import_csv(&mut state, "course_id,course_title\n", &mut |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, LearningError::Import(_)));
    assert_eq!(state, before);

    let err = service
        .import_csv(&mut state, "title,body\nx,y\n", &mut |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, LearningError::Import(_)));
    assert_eq!(state, before);
    assert_eq!(notifier.with_severity(Severity::Error).len(), 2);

    let reloaded = service.load().await;
    assert_eq!(reloaded.courses(), before.courses());
}

#[tokio::test]
async fn finishing_a_module_unlocks_the_next_exactly_once() {
    let storage = Storage::in_memory();
    let (service, notifier) = service(&storage);
    let mut state = imported(&service).await;

    let events = service
        .complete_lesson(&mut state, &LessonId::new("l1"))
        .await
        .unwrap();
    assert!(events.is_empty());

    let events = service
        .complete_lesson(&mut state, &LessonId::new("l2"))
        .await
        .unwrap();
    assert_eq!(
        events,
        vec![UnlockEvent::Module {
            course_id: CourseId::new("c1"),
            module_id: ModuleId::new("m2"),
            title: "Traits".into(),
        }]
    );

    let events = service
        .complete_lesson(&mut state, &LessonId::new("l2"))
        .await
        .unwrap();
    assert!(events.is_empty());

    let events = service
        .complete_lesson(&mut state, &LessonId::new("l3"))
        .await
        .unwrap();
    assert_eq!(
        events,
        vec![UnlockEvent::Course {
            course_id: CourseId::new("c2"),
            title: "Async Rust".into(),
        }]
    );

    let announced = notifier.with_severity(Severity::Success);
    assert!(announced.contains(&"Module unlocked: Traits".to_owned()));
    assert!(announced.contains(&"Course unlocked: Async Rust".to_owned()));

    let reloaded = service.load().await;
    let c1 = reloaded.course(&CourseId::new("c1")).unwrap();
    assert_eq!(c1.completed_lessons, 3);
    assert!(reloaded.completion().is_module_unlocked(&ModuleId::new("m2")));
}

#[tokio::test]
async fn unknown_lesson_is_a_lookup_error() {
    let storage = Storage::in_memory();
    let (service, _) = service(&storage);
    let mut state = imported(&service).await;
    let before = state.clone();

    let err = service
        .complete_lesson(&mut state, &LessonId::new("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, LearningError::Lookup(_)));
    assert_eq!(state, before);
}

#[tokio::test]
async fn lessons_behind_a_lock_cannot_be_completed() {
    let storage = Storage::in_memory();
    let (service, notifier) = service(&storage);
    let mut state = imported(&service).await;
    let before = state.clone();

    let err = service
        .complete_lesson(&mut state, &LessonId::new("l3"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, LearningError::Locked(LockedError::Module(ref title)) if title == "Traits")
    );

    let err = service
        .complete_lesson(&mut state, &LessonId::new("l4"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, LearningError::Locked(LockedError::Course(ref title)) if title == "Async Rust")
    );

    assert_eq!(state, before);
    assert_eq!(notifier.with_severity(Severity::Error).len(), 2);
    assert!(
        !notifier
            .with_severity(Severity::Success)
            .contains(&"Lesson completed!".to_owned())
    );

    let reloaded = service.load().await;
    assert_eq!(reloaded.courses(), before.courses());
}

#[tokio::test]
async fn open_lesson_respects_locks_and_keeps_selection_on_error() {
    let storage = Storage::in_memory();
    let (service, _) = service(&storage);
    let mut state = imported(&service).await;
    let (c1, m1, m2) = (CourseId::new("c1"), ModuleId::new("m1"), ModuleId::new("m2"));

    let lesson = service
        .open_lesson(&mut state, &c1, &m1, &LessonId::new("l1"))
        .unwrap();
    assert_eq!(lesson.title, "Moves");
    let opened = Selection {
        course: Some(c1.clone()),
        module: Some(m1.clone()),
        lesson: Some(LessonId::new("l1")),
    };
    assert_eq!(state.selection(), &opened);

    let err = service
        .open_lesson(&mut state, &c1, &m2, &LessonId::new("l3"))
        .unwrap_err();
    assert!(matches!(err, LearningError::Locked(_)));
    assert_eq!(state.selection(), &opened);

    let err = service
        .open_lesson(&mut state, &c1, &m1, &LessonId::new("l3"))
        .unwrap_err();
    assert!(matches!(err, LearningError::Lookup(_)));

    let err = service
        .open_lesson(
            &mut state,
            &CourseId::new("c2"),
            &ModuleId::new("m3"),
            &LessonId::new("l4"),
        )
        .unwrap_err();
    assert!(matches!(err, LearningError::Locked(_)));
    assert_eq!(state.selection(), &opened);
}

#[tokio::test]
async fn reimport_keeps_progress_without_reannouncing() {
    let storage = Storage::in_memory();
    let (service, _) = service(&storage);
    let mut state = imported(&service).await;
    for id in ["l1", "l2"] {
        service
            .complete_lesson(&mut state, &LessonId::new(id))
            .await
            .unwrap();
    }

    let summary = service
        .import_csv(&mut state, CATALOG, &mut |_| {})
        .await
        .unwrap();
    assert!(summary.unlocks.is_empty());

    let c1 = state.course(&CourseId::new("c1")).unwrap();
    assert_eq!(c1.completed_lessons, 2);
    assert!(!c1.modules[1].is_locked);
}

#[tokio::test]
async fn reset_clears_memory_and_store() {
    let storage = Storage::in_memory();
    let (service, _) = service(&storage);
    let mut state = imported(&service).await;
    service
        .complete_lesson(&mut state, &LessonId::new("l1"))
        .await
        .unwrap();

    service.reset(&mut state).await.unwrap();
    assert!(state.is_empty());
    assert!(state.completion().is_empty());

    let reloaded = service.load().await;
    assert!(reloaded.is_empty());
    assert!(reloaded.completion().is_empty());
}
