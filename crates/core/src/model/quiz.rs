use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestionId, QuizId};

/// A compiled multiple-choice question.
///
/// `options` holds the correct answer exactly once plus the authored wrong
/// options, in shuffled order; `correct_index` points at the correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub correct_answer: String,
    pub explanation: String,
}

impl Question {
    #[must_use]
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_index
    }
}

/// End-of-module quiz with attempt bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    pub questions: Vec<Question>,
    /// Percent needed to pass.
    pub passing_score: u8,
    /// Minutes.
    pub time_limit: u32,
    pub attempts: u32,
    pub max_attempts: u32,
    pub completed: bool,
    pub passed: bool,
    /// Percent, never decreases.
    pub best_score: u8,
}

impl Quiz {
    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit.saturating_mul(60)
    }

    #[must_use]
    pub fn attempts_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Whether the quiz counts towards module completion.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.completed && self.passed
    }

    /// Record a submitted attempt.
    pub fn record_result(&mut self, score: u8, passed: bool) {
        self.best_score = self.best_score.max(score);
        self.completed = true;
        self.passed = passed;
    }
}

/// Percentage of correct answers, rounded half up. Zero questions score 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn score_percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (100.0 * correct as f64 / total as f64).round();
    pct.clamp(0.0, 100.0) as u8
}
