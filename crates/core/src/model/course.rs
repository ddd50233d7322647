use serde::{Deserialize, Serialize};

use crate::model::ids::{CourseId, LessonId, ModuleId};
use crate::model::lesson::Lesson;
use crate::model::quiz::Quiz;

/// An ordered group of lessons with an optional closing quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: ModuleId,
    pub title: String,
    pub description: String,
    pub duration: u32,
    pub order: u32,
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub quiz: Option<Quiz>,
    pub total_lessons: u32,
    pub completed_lessons: u32,
    pub completed_quizzes: u32,
    pub is_locked: bool,
}

impl Module {
    /// Recompute the cached counters from the lessons and quiz.
    pub fn recount(&mut self) {
        self.total_lessons = count(self.lessons.len());
        self.completed_lessons = count(self.lessons.iter().filter(|l| l.completed).count());
        self.completed_quizzes = u32::from(self.quiz.as_ref().is_some_and(Quiz::is_cleared));
    }

    #[must_use]
    pub fn all_lessons_completed(&self) -> bool {
        self.completed_lessons >= self.total_lessons
    }

    /// All lessons done and, if there is a quiz, it was completed and passed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_lessons == self.total_lessons
            && self.quiz.as_ref().is_none_or(Quiz::is_cleared)
    }

    #[must_use]
    pub fn lesson(&self, id: &LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|l| &l.id == id)
    }
}

/// Top-level course with its ordered modules and cached progress counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Minutes.
    pub duration: u32,
    pub difficulty: String,
    pub prerequisites: String,
    pub modules: Vec<Module>,
    pub total_lessons: u32,
    pub total_quizzes: u32,
    pub completed_lessons: u32,
    pub completed_quizzes: u32,
    pub is_locked: bool,
}

impl Course {
    /// Recompute course counters from the modules' counters.
    ///
    /// Module counters must be current; call `Module::recount` first.
    pub fn recount(&mut self) {
        self.total_lessons = self.modules.iter().map(|m| m.total_lessons).sum();
        self.completed_lessons = self.modules.iter().map(|m| m.completed_lessons).sum();
        self.total_quizzes = count(self.modules.iter().filter(|m| m.quiz.is_some()).count());
        self.completed_quizzes = self.modules.iter().map(|m| m.completed_quizzes).sum();
    }

    /// Every module is complete. A course without modules is trivially complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.modules.iter().all(Module::is_complete)
    }

    #[must_use]
    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| &m.id == id)
    }

    pub fn module_mut(&mut self, id: &ModuleId) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| &m.id == id)
    }

    /// Rounded percentage of completed lessons.
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        crate::model::quiz::score_percent(
            self.completed_lessons as usize,
            self.total_lessons as usize,
        )
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
