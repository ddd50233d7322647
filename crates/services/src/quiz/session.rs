use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use learn_core::model::{CourseId, Module, ModuleId, Question, QuestionId, Quiz, QuizId, score_percent};

/// Label shown in reviews for questions left blank.
pub const NOT_ANSWERED: &str = "Not answered";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSessionError {
    #[error("complete all lessons in this module before taking the quiz ({completed}/{total} done)")]
    Prerequisite { completed: u32, total: u32 },

    #[error("no attempts left ({attempts}/{max} used)")]
    AttemptsExhausted { attempts: u32, max: u32 },

    #[error("quiz already started")]
    AlreadyStarted,

    #[error("quiz is not in progress")]
    NotInProgress,

    #[error("question {index} out of range ({count} questions)")]
    QuestionOutOfRange { index: usize, count: usize },

    #[error("option {index} out of range ({count} options)")]
    OptionOutOfRange { index: usize, count: usize },
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    NotStarted,
    InProgress,
    Submitted,
    Abandoned,
}

/// What a countdown tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session is not running; nothing changed.
    Idle,
    Running { remaining_secs: u32 },
    /// Time ran out and the session was submitted.
    Expired(QuizResult),
}

/// Per-question outcome shown after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerReview {
    pub question_id: QuestionId,
    pub question_text: String,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: String,
}

impl AnswerReview {
    #[must_use]
    pub fn user_answer_label(&self) -> &str {
        self.user_answer.as_deref().unwrap_or(NOT_ANSWERED)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub quiz_id: QuizId,
    pub score: u8,
    pub correct_count: usize,
    pub total_questions: usize,
    pub passed: bool,
    pub auto_submitted: bool,
    pub submitted_at: DateTime<Utc>,
    pub review: Vec<AnswerReview>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One attempt at a module quiz: `NotStarted → InProgress → Submitted`.
///
/// The session works on its own copy of the questions; results are applied to
/// the learner state by the caller.
pub struct QuizSession {
    id: Uuid,
    course_id: CourseId,
    module_id: ModuleId,
    quiz_id: QuizId,
    title: String,
    questions: Vec<Question>,
    passing_score: u8,
    time_limit_secs: u32,
    answers: Vec<Option<usize>>,
    current: usize,
    time_remaining: u32,
    phase: QuizPhase,
    started_at: Option<DateTime<Utc>>,
    result: Option<QuizResult>,
}

impl QuizSession {
    #[must_use]
    pub fn new(course_id: CourseId, module_id: ModuleId, quiz: &Quiz) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id,
            module_id,
            quiz_id: quiz.id.clone(),
            title: quiz.title.clone(),
            questions: quiz.questions.clone(),
            passing_score: quiz.passing_score,
            time_limit_secs: quiz.time_limit_secs(),
            answers: Vec::new(),
            current: 0,
            time_remaining: 0,
            phase: QuizPhase::NotStarted,
            started_at: None,
            result: None,
        }
    }

    /// Begin the attempt once every lesson of `module` is complete.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Prerequisite` if lessons are outstanding,
    /// `AttemptsExhausted` if the quiz has no attempts left and
    /// `AlreadyStarted` unless the session is `NotStarted`. The session is
    /// unchanged on error.
    pub fn start(&mut self, module: &Module, now: DateTime<Utc>) -> Result<(), QuizSessionError> {
        if self.phase != QuizPhase::NotStarted {
            return Err(QuizSessionError::AlreadyStarted);
        }
        if !module.all_lessons_completed() {
            return Err(QuizSessionError::Prerequisite {
                completed: module.completed_lessons,
                total: module.total_lessons,
            });
        }
        if let Some(quiz) = module.quiz.as_ref().filter(|q| q.attempts_exhausted()) {
            return Err(QuizSessionError::AttemptsExhausted {
                attempts: quiz.attempts,
                max: quiz.max_attempts,
            });
        }

        self.answers = vec![None; self.questions.len()];
        self.current = 0;
        self.time_remaining = self.time_limit_secs;
        self.started_at = Some(now);
        self.phase = QuizPhase::InProgress;
        Ok(())
    }

    /// Record or overwrite the answer to a question. Does not advance.
    ///
    /// # Errors
    ///
    /// Returns `NotInProgress` outside `InProgress`, or an out-of-range error.
    pub fn select_answer(
        &mut self,
        question_index: usize,
        option_index: usize,
    ) -> Result<(), QuizSessionError> {
        self.ensure_in_progress()?;
        let question = self.questions.get(question_index).ok_or(
            QuizSessionError::QuestionOutOfRange {
                index: question_index,
                count: self.questions.len(),
            },
        )?;
        if option_index >= question.options.len() {
            return Err(QuizSessionError::OptionOutOfRange {
                index: option_index,
                count: question.options.len(),
            });
        }
        self.answers[question_index] = Some(option_index);
        Ok(())
    }

    /// Move to a question, clamped to the valid range. Returns the new index.
    ///
    /// # Errors
    ///
    /// Returns `NotInProgress` outside `InProgress`.
    pub fn go_to(&mut self, question_index: usize) -> Result<usize, QuizSessionError> {
        self.ensure_in_progress()?;
        self.current = question_index.min(self.questions.len().saturating_sub(1));
        Ok(self.current)
    }

    /// # Errors
    ///
    /// Returns `NotInProgress` outside `InProgress`.
    pub fn next(&mut self) -> Result<usize, QuizSessionError> {
        self.go_to(self.current.saturating_add(1))
    }

    /// # Errors
    ///
    /// Returns `NotInProgress` outside `InProgress`.
    pub fn previous(&mut self) -> Result<usize, QuizSessionError> {
        self.go_to(self.current.saturating_sub(1))
    }

    /// Score the attempt.
    ///
    /// Returns `Ok(None)` if the session was already submitted or abandoned.
    ///
    /// # Errors
    ///
    /// Returns `NotInProgress` if the session never started.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<Option<QuizResult>, QuizSessionError> {
        match self.phase {
            QuizPhase::NotStarted => Err(QuizSessionError::NotInProgress),
            QuizPhase::Submitted | QuizPhase::Abandoned => Ok(None),
            QuizPhase::InProgress => Ok(Some(self.finalize(now, false))),
        }
    }

    /// Advance the countdown by one second; submits when it reaches zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.phase != QuizPhase::InProgress {
            return TickOutcome::Idle;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            return TickOutcome::Expired(self.finalize(now, true));
        }
        TickOutcome::Running {
            remaining_secs: self.time_remaining,
        }
    }

    /// Leave an in-progress attempt without scoring it. Returns true if the
    /// session was running.
    pub fn abandon(&mut self) -> bool {
        if self.phase != QuizPhase::InProgress {
            return false;
        }
        self.phase = QuizPhase::Abandoned;
        true
    }

    fn finalize(&mut self, now: DateTime<Utc>, auto_submitted: bool) -> QuizResult {
        let review: Vec<AnswerReview> = self
            .questions
            .iter()
            .zip(&self.answers)
            .map(|(question, answer)| AnswerReview {
                question_id: question.id.clone(),
                question_text: question.text.clone(),
                user_answer: answer.and_then(|idx| question.options.get(idx).cloned()),
                correct_answer: question.correct_answer.clone(),
                is_correct: answer.is_some_and(|idx| question.is_correct(idx)),
                explanation: question.explanation.clone(),
            })
            .collect();

        let correct_count = review.iter().filter(|r| r.is_correct).count();
        let total_questions = self.questions.len();
        let score = score_percent(correct_count, total_questions);
        let result = QuizResult {
            quiz_id: self.quiz_id.clone(),
            score,
            correct_count,
            total_questions,
            passed: score >= self.passing_score,
            auto_submitted,
            submitted_at: now,
            review,
        };

        self.phase = QuizPhase::Submitted;
        self.result = Some(result.clone());
        result
    }

    fn ensure_in_progress(&self) -> Result<(), QuizSessionError> {
        if self.phase == QuizPhase::InProgress {
            Ok(())
        } else {
            Err(QuizSessionError::NotInProgress)
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn module_id(&self) -> &ModuleId {
        &self.module_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn passing_score(&self) -> u8 {
        self.passing_score
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn answer(&self, question_index: usize) -> Option<usize> {
        self.answers.get(question_index).copied().flatten()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("quiz_id", &self.quiz_id)
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("time_remaining", &self.time_remaining)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
