use std::sync::Arc;

use learn_core::model::{CourseId, ModuleId};
use learn_core::{Clock, LearnerState, UnlockEvent};
use storage::LearnerStore;

use super::session::{QuizResult, QuizSession, TickOutcome};
use crate::error::QuizServiceError;
use crate::notify::{Notifier, Severity};

/// A submitted attempt together with what it unlocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizReport {
    pub result: QuizResult,
    pub unlocks: Vec<UnlockEvent>,
}

/// Service-level view of one countdown tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickReport {
    Idle,
    Running { remaining_secs: u32 },
    Expired(QuizReport),
}

/// Runs quiz attempts against a `LearnerState` and persists every change.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    store: LearnerStore,
    notifier: Arc<dyn Notifier>,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, store: LearnerStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            clock,
            store,
            notifier,
        }
    }

    /// Start an attempt at a module's quiz and count it.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Lookup` for unknown ids,
    /// `QuizServiceError::Locked` while the course or module is locked,
    /// `QuizServiceError::Session` when the lessons are unfinished or the
    /// attempts are used up, and `QuizServiceError::Storage` if the new
    /// attempt count cannot be saved. `state` is unchanged on any error.
    pub async fn start_quiz(
        &self,
        state: &mut LearnerState,
        course_id: &CourseId,
        module_id: &ModuleId,
    ) -> Result<QuizSession, QuizServiceError> {
        if let Err(err) = state.ensure_unlocked(course_id, module_id) {
            self.refuse(module_id, &err);
            return Err(err.into());
        }
        let module = state.module(course_id, module_id)?;
        let quiz = state.quiz(course_id, module_id)?;
        let mut session = QuizSession::new(course_id.clone(), module_id.clone(), quiz);

        if let Err(err) = session.start(module, self.clock.now()) {
            self.refuse(module_id, &err);
            return Err(err.into());
        }

        let mut next = state.clone();
        let attempts = next.begin_quiz_attempt(course_id, module_id)?;
        self.persist(&next).await?;
        *state = next;
        tracing::info!(quiz_id = %session.quiz_id(), attempts, "quiz started");
        Ok(session)
    }

    /// Submit the attempt and apply the result.
    ///
    /// Returns `Ok(None)` when the session was already submitted or abandoned.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Session` if the session never started, or a
    /// lookup/storage error while applying the result.
    pub async fn submit(
        &self,
        state: &mut LearnerState,
        session: &mut QuizSession,
    ) -> Result<Option<QuizReport>, QuizServiceError> {
        match session.submit(self.clock.now())? {
            Some(result) => self.finish(state, session, result).await.map(Some),
            None => Ok(None),
        }
    }

    /// Count down one second; an expiring countdown submits the attempt.
    ///
    /// # Errors
    ///
    /// Returns a lookup/storage error while applying an auto-submitted result.
    pub async fn tick(
        &self,
        state: &mut LearnerState,
        session: &mut QuizSession,
    ) -> Result<TickReport, QuizServiceError> {
        match session.tick(self.clock.now()) {
            TickOutcome::Idle => Ok(TickReport::Idle),
            TickOutcome::Running { remaining_secs } => Ok(TickReport::Running { remaining_secs }),
            TickOutcome::Expired(result) => {
                self.notifier
                    .notify("Time is up! Your quiz was submitted.", Severity::Warning);
                let report = self.finish(state, session, result).await?;
                Ok(TickReport::Expired(report))
            }
        }
    }

    /// Leave a running attempt unscored. The attempt still counts.
    pub fn abandon(&self, session: &mut QuizSession) -> bool {
        let abandoned = session.abandon();
        if abandoned {
            tracing::info!(quiz_id = %session.quiz_id(), "quiz abandoned");
            self.notifier.notify("Quiz abandoned", Severity::Info);
        }
        abandoned
    }

    async fn finish(
        &self,
        state: &mut LearnerState,
        session: &QuizSession,
        result: QuizResult,
    ) -> Result<QuizReport, QuizServiceError> {
        let mut next = state.clone();
        let unlocks = next.record_quiz_result(
            session.course_id(),
            session.module_id(),
            result.score,
            result.passed,
        )?;
        self.persist(&next).await?;
        *state = next;

        tracing::info!(
            quiz_id = %result.quiz_id,
            score = result.score,
            passed = result.passed,
            auto_submitted = result.auto_submitted,
            "quiz submitted"
        );
        if result.passed {
            self.notifier.notify(
                &format!("Quiz passed with {}%!", result.score),
                Severity::Success,
            );
        } else {
            self.notifier.notify(
                &format!(
                    "Quiz score {}%. You need {}% to pass.",
                    result.score,
                    session.passing_score()
                ),
                Severity::Warning,
            );
        }
        for event in &unlocks {
            tracing::info!(%event, "unlocked");
            self.notifier.notify(&event.to_string(), Severity::Success);
        }

        Ok(QuizReport { result, unlocks })
    }

    fn refuse(&self, module_id: &ModuleId, err: &dyn std::error::Error) {
        tracing::warn!(%module_id, error = %err, "quiz start refused");
        self.notifier.notify(&err.to_string(), Severity::Warning);
    }

    async fn persist(&self, state: &LearnerState) -> Result<(), QuizServiceError> {
        self.store
            .save(state.courses(), state.quiz_attempts(), state.completion())
            .await?;
        Ok(())
    }
}
