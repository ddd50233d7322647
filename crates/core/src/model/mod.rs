mod completion;
mod course;
mod ids;
mod lesson;
mod quiz;
mod settings;

pub use completion::{CompletionRecord, QuizAttempts};
pub use course::{Course, Module};
pub use ids::{CourseId, LessonId, ModuleId, QuestionId, QuizId};
pub use lesson::{InteractiveContent, Lesson, LessonKind, LessonType};
pub use quiz::{Question, Quiz, score_percent};
pub use settings::{CourseDefaults, SettingsError};
