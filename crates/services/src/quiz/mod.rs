//! Timed module quizzes: the attempt state machine, its countdown task and the
//! service that applies results to learner state.

pub mod service;
pub mod session;
pub mod timer;

pub use service::{QuizReport, QuizService, TickReport};
pub use session::{
    AnswerReview, NOT_ANSWERED, QuizPhase, QuizResult, QuizSession, QuizSessionError, TickOutcome,
};
pub use timer::{QuizTimer, TICK_PERIOD, TimerTick};
