#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod learning_service;
pub mod notify;
pub mod quiz;

pub use learn_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, LearningError, QuizServiceError};
pub use learning_service::{ImportSummary, LearningService};
pub use notify::{MemoryNotifier, Notifier, Severity, TracingNotifier};
pub use quiz::{
    AnswerReview, QuizPhase, QuizReport, QuizResult, QuizService, QuizSession, QuizSessionError,
    QuizTimer, TICK_PERIOD, TickOutcome, TickReport, TimerTick,
};
