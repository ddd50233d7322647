use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::ids::{LessonId, ModuleId, QuizId};

/// Learner state that survives re-imports: which lessons and quizzes are done
/// and which modules were unlocked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    #[serde(default)]
    pub completed_lessons: BTreeSet<LessonId>,
    #[serde(default)]
    pub completed_quizzes: BTreeSet<QuizId>,
    #[serde(default)]
    pub unlocked_modules: BTreeSet<ModuleId>,
}

impl CompletionRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_lesson(&self, id: &LessonId) -> bool {
        self.completed_lessons.contains(id)
    }

    #[must_use]
    pub fn has_quiz(&self, id: &QuizId) -> bool {
        self.completed_quizzes.contains(id)
    }

    #[must_use]
    pub fn is_module_unlocked(&self, id: &ModuleId) -> bool {
        self.unlocked_modules.contains(id)
    }

    /// Returns true if the lesson was not recorded before.
    pub fn complete_lesson(&mut self, id: LessonId) -> bool {
        self.completed_lessons.insert(id)
    }

    /// Returns true if the quiz was not recorded before.
    pub fn complete_quiz(&mut self, id: QuizId) -> bool {
        self.completed_quizzes.insert(id)
    }

    /// Returns true if the module was not recorded before.
    pub fn unlock_module(&mut self, id: ModuleId) -> bool {
        self.unlocked_modules.insert(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed_lessons.is_empty()
            && self.completed_quizzes.is_empty()
            && self.unlocked_modules.is_empty()
    }
}

/// Attempt counters per quiz id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizAttempts(BTreeMap<QuizId, u32>);

impl QuizAttempts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &QuizId) -> u32 {
        self.0.get(id).copied().unwrap_or(0)
    }

    pub fn set(&mut self, id: QuizId, attempts: u32) {
        self.0.insert(id, attempts);
    }

    /// Increment and return the new count.
    pub fn increment(&mut self, id: &QuizId) -> u32 {
        let entry = self.0.entry(id.clone()).or_insert(0);
        *entry = entry.saturating_add(1);
        *entry
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuizId, u32)> {
        self.0.iter().map(|(id, n)| (id, *n))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_matches_wire_shape() {
        let json = serde_json::to_value(CompletionRecord::new()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "completedLessons": [],
                "completedQuizzes": [],
                "unlockedModules": []
            })
        );
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let record: CompletionRecord =
            serde_json::from_str(r#"{"completedLessons":["l1"]}"#).unwrap();
        assert!(record.has_lesson(&LessonId::new("l1")));
        assert!(record.unlocked_modules.is_empty());
    }

    #[test]
    fn inserts_report_novelty() {
        let mut record = CompletionRecord::new();
        assert!(record.unlock_module(ModuleId::new("m2")));
        assert!(!record.unlock_module(ModuleId::new("m2")));
    }

    #[test]
    fn attempts_serialize_as_map() {
        let mut attempts = QuizAttempts::new();
        assert_eq!(attempts.increment(&QuizId::new("m1-quiz")), 1);
        assert_eq!(attempts.increment(&QuizId::new("m1-quiz")), 2);
        let json = serde_json::to_value(&attempts).unwrap();
        assert_eq!(json, serde_json::json!({ "m1-quiz": 2 }));
    }
}
