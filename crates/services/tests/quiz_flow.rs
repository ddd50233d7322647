use std::sync::Arc;

use learn_core::model::{CourseDefaults, CourseId, LessonId, ModuleId};
use learn_core::time::fixed_now;
use learn_core::{LearnerState, LockedError, UnlockEvent};
use services::{
    Clock, LearningService, MemoryNotifier, QuizPhase, QuizService, QuizServiceError,
    QuizSession, QuizSessionError, QuizTimer, Severity, TICK_PERIOD, TickReport,
};
use storage::repository::Storage;

const CATALOG: &str = "\
course_id,course_title,module_id,module_title,module_order,lesson_id,lesson_title,lesson_order,quiz_questions
c1,Rust Basics,m1,Ownership,1,l1,Moves,1,What is 2+2?|4|3|5~Capital of France?|Paris|Rome
c1,Rust Basics,m2,Traits,2,l2,Generics,1,What is a trait?|An interface|A struct
";

struct Harness {
    storage: Storage,
    learning: LearningService,
    quizzes: QuizService,
    notifier: MemoryNotifier,
    state: LearnerState,
}

impl Harness {
    async fn new(defaults: CourseDefaults) -> Self {
        let storage = Storage::in_memory();
        let notifier = MemoryNotifier::new();
        let learning = LearningService::new(storage.learner_store(), Arc::new(notifier.clone()))
            .with_defaults(defaults);
        let quizzes = QuizService::new(
            Clock::fixed(fixed_now()),
            storage.learner_store(),
            Arc::new(notifier.clone()),
        );
        let mut state = learning.load().await;
        learning
            .import_csv(&mut state, CATALOG, &mut |_| {})
            .await
            .unwrap();
        Self {
            storage,
            learning,
            quizzes,
            notifier,
            state,
        }
    }

    async fn finish_lessons(&mut self) {
        self.learning
            .complete_lesson(&mut self.state, &LessonId::new("l1"))
            .await
            .unwrap();
    }

    async fn start(&mut self) -> Result<QuizSession, QuizServiceError> {
        self.quizzes
            .start_quiz(&mut self.state, &CourseId::new("c1"), &ModuleId::new("m1"))
            .await
    }
}

fn answer_all(session: &mut QuizSession, correct: bool) {
    let picks: Vec<usize> = session
        .questions()
        .iter()
        .map(|q| {
            if correct {
                q.correct_index
            } else {
                (q.correct_index + 1) % q.options.len()
            }
        })
        .collect();
    for (question, option) in picks.into_iter().enumerate() {
        session.select_answer(question, option).unwrap();
    }
}

#[tokio::test]
async fn start_before_lessons_warns_and_changes_nothing() {
    let mut h = Harness::new(CourseDefaults::default()).await;
    let before = h.state.clone();

    let err = h.start().await.unwrap_err();
    assert!(matches!(
        err,
        QuizServiceError::Session(QuizSessionError::Prerequisite {
            completed: 0,
            total: 1
        })
    ));
    assert_eq!(h.state, before);
    assert_eq!(h.notifier.with_severity(Severity::Warning).len(), 1);
}

#[tokio::test]
async fn quiz_in_a_locked_module_cannot_be_started() {
    let mut h = Harness::new(CourseDefaults::default()).await;
    h.finish_lessons().await;
    let before = h.state.clone();

    let err = h
        .quizzes
        .start_quiz(&mut h.state, &CourseId::new("c1"), &ModuleId::new("m2"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, QuizServiceError::Locked(LockedError::Module(ref title)) if title == "Traits")
    );
    assert_eq!(h.state, before);
    assert_eq!(
        h.state
            .quiz(&CourseId::new("c1"), &ModuleId::new("m2"))
            .unwrap()
            .attempts,
        0
    );
    assert_eq!(h.notifier.with_severity(Severity::Warning).len(), 1);
}

#[tokio::test]
async fn passing_quiz_unlocks_next_module_and_persists() {
    let mut h = Harness::new(CourseDefaults::default()).await;
    h.finish_lessons().await;

    let mut session = h.start().await.unwrap();
    assert_eq!(session.phase(), QuizPhase::InProgress);
    assert_eq!(session.time_remaining(), 15 * 60);
    answer_all(&mut session, true);

    let report = h
        .quizzes
        .submit(&mut h.state, &mut session)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.result.score, 100);
    assert!(report.result.passed);
    assert!(!report.result.auto_submitted);
    assert_eq!(
        report.unlocks,
        vec![UnlockEvent::Module {
            course_id: CourseId::new("c1"),
            module_id: ModuleId::new("m2"),
            title: "Traits".into(),
        }]
    );

    assert!(
        h.quizzes
            .submit(&mut h.state, &mut session)
            .await
            .unwrap()
            .is_none()
    );

    let reloaded = LearningService::new(h.storage.learner_store(), Arc::new(MemoryNotifier::new()))
        .load()
        .await;
    let quiz = reloaded
        .quiz(&CourseId::new("c1"), &ModuleId::new("m1"))
        .unwrap();
    assert_eq!(quiz.best_score, 100);
    assert_eq!(quiz.attempts, 1);
    assert!(quiz.passed);
    let module = reloaded
        .module(&CourseId::new("c1"), &ModuleId::new("m2"))
        .unwrap();
    assert!(!module.is_locked);
}

#[tokio::test]
async fn failing_quiz_keeps_next_module_locked_and_best_score_never_drops() {
    let mut h = Harness::new(CourseDefaults::default()).await;
    h.finish_lessons().await;

    let mut session = h.start().await.unwrap();
    let correct = session.questions()[0].correct_index;
    session.select_answer(0, correct).unwrap();
    let first = h
        .quizzes
        .submit(&mut h.state, &mut session)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.result.score, 50);
    assert!(!first.result.passed);
    assert!(first.unlocks.is_empty());
    assert_eq!(first.result.review[1].user_answer_label(), "Not answered");
    assert!(
        h.state
            .module(&CourseId::new("c1"), &ModuleId::new("m2"))
            .unwrap()
            .is_locked
    );

    let mut session = h.start().await.unwrap();
    answer_all(&mut session, false);
    let second = h
        .quizzes
        .submit(&mut h.state, &mut session)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.result.score, 0);

    let quiz = h
        .state
        .quiz(&CourseId::new("c1"), &ModuleId::new("m1"))
        .unwrap();
    assert_eq!(quiz.best_score, 50);
    assert_eq!(quiz.attempts, 2);
    assert!(quiz.completed);
    assert!(!quiz.passed);
}

#[tokio::test]
async fn attempts_run_out() {
    let defaults = CourseDefaults::new(70, 15, 1).unwrap();
    let mut h = Harness::new(defaults).await;
    h.finish_lessons().await;

    let mut session = h.start().await.unwrap();
    h.quizzes
        .submit(&mut h.state, &mut session)
        .await
        .unwrap();

    let before = h.state.clone();
    let err = h.start().await.unwrap_err();
    assert!(matches!(
        err,
        QuizServiceError::Session(QuizSessionError::AttemptsExhausted {
            attempts: 1,
            max: 1
        })
    ));
    assert_eq!(h.state, before);
}

#[tokio::test(start_paused = true)]
async fn countdown_auto_submits_once() {
    let defaults = CourseDefaults::new(70, 1, 3).unwrap();
    let mut h = Harness::new(defaults).await;
    h.finish_lessons().await;

    let mut session = h.start().await.unwrap();
    answer_all(&mut session, true);

    let (timer, mut ticks) = QuizTimer::start(TICK_PERIOD);
    let mut elapsed = 0;
    let report = loop {
        ticks.recv().await.unwrap();
        elapsed += 1;
        match h.quizzes.tick(&mut h.state, &mut session).await.unwrap() {
            TickReport::Expired(report) => break report,
            TickReport::Running { remaining_secs } => assert_eq!(remaining_secs, 60 - elapsed),
            TickReport::Idle => panic!("session stopped early"),
        }
    };
    timer.stop();

    assert_eq!(elapsed, 60);
    assert!(report.result.auto_submitted);
    assert!(report.result.passed);
    assert_eq!(session.phase(), QuizPhase::Submitted);
    assert_eq!(
        h.quizzes.tick(&mut h.state, &mut session).await.unwrap(),
        TickReport::Idle
    );
    assert!(
        h.quizzes
            .submit(&mut h.state, &mut session)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn abandoned_attempt_still_counts_but_is_never_scored() {
    let mut h = Harness::new(CourseDefaults::default()).await;
    h.finish_lessons().await;

    let mut session = h.start().await.unwrap();
    assert!(h.quizzes.abandon(&mut session));
    assert_eq!(session.phase(), QuizPhase::Abandoned);
    assert_eq!(
        h.quizzes.tick(&mut h.state, &mut session).await.unwrap(),
        TickReport::Idle
    );
    assert!(
        h.quizzes
            .submit(&mut h.state, &mut session)
            .await
            .unwrap()
            .is_none()
    );

    let quiz = h
        .state
        .quiz(&CourseId::new("c1"), &ModuleId::new("m1"))
        .unwrap();
    assert_eq!(quiz.attempts, 1);
    assert!(!quiz.completed);
}
