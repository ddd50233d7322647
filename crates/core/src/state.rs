//! Single container for everything a learner session mutates.
//!
//! Content (`courses`) is rebuilt from imports; the completion record and
//! attempt counters live independently and are overlaid by id after every
//! change.

use std::collections::HashMap;

use crate::error::{AccessError, LockedError, LookupError};
use crate::model::{
    CompletionRecord, Course, CourseId, Lesson, LessonId, Module, ModuleId, Quiz, QuizAttempts,
    QuizId,
};
use crate::progression::{self, UnlockEvent};

/// Current navigation pointers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub course: Option<CourseId>,
    pub module: Option<ModuleId>,
    pub lesson: Option<LessonId>,
}

/// Learner state: content hierarchy, completion overlay and selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnerState {
    courses: Vec<Course>,
    completion: CompletionRecord,
    quiz_attempts: QuizAttempts,
    selection: Selection,
}

impl LearnerState {
    /// Rehydrate from persisted parts and reconcile. Unlocks restored here are
    /// not reported.
    #[must_use]
    pub fn from_parts(
        courses: Vec<Course>,
        quiz_attempts: QuizAttempts,
        completion: CompletionRecord,
    ) -> Self {
        let mut state = Self {
            courses,
            completion,
            quiz_attempts,
            selection: Selection::default(),
        };
        state.overlay_attempts();
        progression::reconcile(&mut state.courses, &mut state.completion);
        state
    }

    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    #[must_use]
    pub fn completion(&self) -> &CompletionRecord {
        &self.completion
    }

    #[must_use]
    pub fn quiz_attempts(&self) -> &QuizAttempts {
        &self.quiz_attempts
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// # Errors
    ///
    /// Returns `LookupError::Course` if the id is unknown.
    pub fn course(&self, course_id: &CourseId) -> Result<&Course, LookupError> {
        self.courses
            .iter()
            .find(|c| &c.id == course_id)
            .ok_or_else(|| LookupError::Course(course_id.clone()))
    }

    /// # Errors
    ///
    /// Returns `LookupError` if the course or module is unknown.
    pub fn module(&self, course_id: &CourseId, module_id: &ModuleId) -> Result<&Module, LookupError> {
        self.course(course_id)?
            .module(module_id)
            .ok_or_else(|| LookupError::Module {
                course_id: course_id.clone(),
                module_id: module_id.clone(),
            })
    }

    /// # Errors
    ///
    /// Returns `LookupError` if the course, module or lesson is unknown.
    pub fn lesson(
        &self,
        course_id: &CourseId,
        module_id: &ModuleId,
        lesson_id: &LessonId,
    ) -> Result<&Lesson, LookupError> {
        self.module(course_id, module_id)?
            .lesson(lesson_id)
            .ok_or_else(|| LookupError::Lesson(lesson_id.clone()))
    }

    /// # Errors
    ///
    /// Returns `LookupError::Quiz` if the module has no quiz.
    pub fn quiz(&self, course_id: &CourseId, module_id: &ModuleId) -> Result<&Quiz, LookupError> {
        self.module(course_id, module_id)?
            .quiz
            .as_ref()
            .ok_or_else(|| LookupError::Quiz(module_id.clone()))
    }

    /// Swap in a freshly imported hierarchy.
    ///
    /// Best scores, failed-attempt flags and course unlocks of the previous
    /// hierarchy are carried over by id before the completion overlay runs.
    pub fn replace_courses(&mut self, mut courses: Vec<Course>) -> Vec<UnlockEvent> {
        carry_over(&self.courses, &mut courses);
        self.courses = courses;
        self.selection = Selection::default();
        self.overlay_attempts();
        self.reconcile()
    }

    /// Point the selection at a lesson. The caller checks locks first.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if any id is unknown; the selection is unchanged.
    pub fn select_lesson(
        &mut self,
        course_id: &CourseId,
        module_id: &ModuleId,
        lesson_id: &LessonId,
    ) -> Result<(), LookupError> {
        self.lesson(course_id, module_id, lesson_id)?;
        self.selection = Selection {
            course: Some(course_id.clone()),
            module: Some(module_id.clone()),
            lesson: Some(lesson_id.clone()),
        };
        Ok(())
    }

    /// Refuse while the course or the module is still locked.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Lookup` for unknown ids and `AccessError::Locked`
    /// for locked content.
    pub fn ensure_unlocked(
        &self,
        course_id: &CourseId,
        module_id: &ModuleId,
    ) -> Result<(), AccessError> {
        let course = self.course(course_id)?;
        let module = self.module(course_id, module_id)?;
        match lock_of(course, module) {
            Some(locked) => Err(locked.into()),
            None => Ok(()),
        }
    }

    /// Mark a lesson complete wherever it appears.
    ///
    /// At least one module holding the lesson must be reachable.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Lookup` if no loaded module holds the lesson and
    /// `AccessError::Locked` if every module holding it is locked. The state
    /// is unchanged on error.
    pub fn complete_lesson(&mut self, lesson_id: &LessonId) -> Result<Vec<UnlockEvent>, AccessError> {
        self.ensure_lesson_reachable(lesson_id)?;
        self.completion.complete_lesson(lesson_id.clone());
        Ok(self.reconcile())
    }

    /// Count a new quiz attempt and return the new total.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if the module or its quiz is unknown.
    pub fn begin_quiz_attempt(
        &mut self,
        course_id: &CourseId,
        module_id: &ModuleId,
    ) -> Result<u32, LookupError> {
        let quiz = self.quiz_mut(course_id, module_id)?;
        let quiz_id = quiz.id.clone();
        let attempts = self.quiz_attempts.increment(&quiz_id);
        self.quiz_mut(course_id, module_id)?.attempts = attempts;
        Ok(attempts)
    }

    /// Apply a submitted score; a pass is recorded in the completion record.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if the module or its quiz is unknown.
    pub fn record_quiz_result(
        &mut self,
        course_id: &CourseId,
        module_id: &ModuleId,
        score: u8,
        passed: bool,
    ) -> Result<Vec<UnlockEvent>, LookupError> {
        let quiz = self.quiz_mut(course_id, module_id)?;
        quiz.record_result(score, passed);
        let quiz_id = quiz.id.clone();
        if passed {
            self.completion.complete_quiz(quiz_id);
        }
        Ok(self.reconcile())
    }

    /// Forget all learner progress and content.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn ensure_lesson_reachable(&self, lesson_id: &LessonId) -> Result<(), AccessError> {
        let mut refused = None;
        for course in &self.courses {
            for module in course.modules.iter().filter(|m| m.lesson(lesson_id).is_some()) {
                match lock_of(course, module) {
                    None => return Ok(()),
                    Some(locked) => {
                        refused.get_or_insert(locked);
                    }
                }
            }
        }
        Err(refused.map_or_else(
            || AccessError::from(LookupError::Lesson(lesson_id.clone())),
            AccessError::from,
        ))
    }

    fn reconcile(&mut self) -> Vec<UnlockEvent> {
        progression::reconcile(&mut self.courses, &mut self.completion)
    }

    fn quiz_mut(&mut self, course_id: &CourseId, module_id: &ModuleId) -> Result<&mut Quiz, LookupError> {
        let course = self
            .courses
            .iter_mut()
            .find(|c| &c.id == course_id)
            .ok_or_else(|| LookupError::Course(course_id.clone()))?;
        let module = course
            .module_mut(module_id)
            .ok_or_else(|| LookupError::Module {
                course_id: course_id.clone(),
                module_id: module_id.clone(),
            })?;
        module
            .quiz
            .as_mut()
            .ok_or_else(|| LookupError::Quiz(module_id.clone()))
    }

    fn overlay_attempts(&mut self) {
        for quiz in self
            .courses
            .iter_mut()
            .flat_map(|c| c.modules.iter_mut())
            .filter_map(|m| m.quiz.as_mut())
        {
            quiz.attempts = self.quiz_attempts.get(&quiz.id);
        }
    }
}

fn lock_of(course: &Course, module: &Module) -> Option<LockedError> {
    if course.is_locked {
        Some(LockedError::Course(course.title.clone()))
    } else if module.is_locked {
        Some(LockedError::Module(module.title.clone()))
    } else {
        None
    }
}

fn carry_over(previous: &[Course], next: &mut [Course]) {
    let unlocked_courses: HashMap<&CourseId, bool> = previous
        .iter()
        .map(|c| (&c.id, !c.is_locked))
        .collect();
    let quizzes: HashMap<&QuizId, &Quiz> = previous
        .iter()
        .flat_map(|c| &c.modules)
        .filter_map(|m| m.quiz.as_ref())
        .map(|q| (&q.id, q))
        .collect();

    for course in next.iter_mut() {
        if unlocked_courses.get(&course.id).copied().unwrap_or(false) {
            course.is_locked = false;
        }
        for quiz in course.modules.iter_mut().filter_map(|m| m.quiz.as_mut()) {
            if let Some(old) = quizzes.get(&quiz.id) {
                quiz.best_score = quiz.best_score.max(old.best_score);
                quiz.completed = quiz.completed || old.completed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{CourseTreeBuilder, LinkVideoUrls, OutlineInteractive};
    use crate::model::CourseDefaults;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const CSV: &str = "\
course_id,course_title,module_id,module_title,module_order,lesson_id,lesson_title,lesson_order,quiz_questions
c1,Intro,m1,Basics,1,l1,One,1,Q|A|B
c1,Intro,m1,Basics,1,l2,Two,2,
c1,Intro,m2,Next,2,l3,Three,1,
c2,Later,m9,Far,1,l9,Nine,1,
";

    fn import(text: &str) -> Vec<Course> {
        CourseTreeBuilder::new(CourseDefaults::default(), &LinkVideoUrls, &OutlineInteractive)
            .parse(text, &mut StdRng::seed_from_u64(3), &mut |_| {})
            .unwrap()
            .courses
    }

    fn ids() -> (CourseId, ModuleId) {
        (CourseId::new("c1"), ModuleId::new("m1"))
    }

    #[test]
    fn unknown_lesson_leaves_state_untouched() {
        let mut state = LearnerState::default();
        state.replace_courses(import(CSV));
        let before = state.clone();
        let err = state.complete_lesson(&LessonId::new("nope")).unwrap_err();
        assert_eq!(err, AccessError::Lookup(LookupError::Lesson(LessonId::new("nope"))));
        assert_eq!(state, before);
    }

    #[test]
    fn lessons_behind_a_lock_cannot_be_completed() {
        let mut state = LearnerState::default();
        state.replace_courses(import(CSV));
        let before = state.clone();

        let err = state.complete_lesson(&LessonId::new("l3")).unwrap_err();
        assert_eq!(err, AccessError::Locked(LockedError::Module("Next".into())));
        let err = state.complete_lesson(&LessonId::new("l9")).unwrap_err();
        assert_eq!(err, AccessError::Locked(LockedError::Course("Later".into())));
        assert_eq!(state, before);

        let (course, _) = ids();
        assert!(matches!(
            state.ensure_unlocked(&course, &ModuleId::new("m2")),
            Err(AccessError::Locked(LockedError::Module(_)))
        ));
        assert!(state.ensure_unlocked(&course, &ModuleId::new("m1")).is_ok());
    }

    #[test]
    fn quiz_pass_completes_module_and_unlocks_next() {
        let mut state = LearnerState::default();
        state.replace_courses(import(CSV));
        let (course, module) = ids();

        state.complete_lesson(&LessonId::new("l1")).unwrap();
        let events = state.complete_lesson(&LessonId::new("l2")).unwrap();
        assert!(events.is_empty());

        assert_eq!(state.begin_quiz_attempt(&course, &module).unwrap(), 1);
        let events = state.record_quiz_result(&course, &module, 100, true).unwrap();
        assert_eq!(events.len(), 1);
        assert!(state.completion().has_quiz(&QuizId::new("m1-quiz")));
        assert_eq!(state.quiz(&course, &module).unwrap().attempts, 1);
    }

    #[test]
    fn reimport_keeps_progress_and_best_scores() {
        let mut state = LearnerState::default();
        state.replace_courses(import(CSV));
        let (course, module) = ids();
        state.complete_lesson(&LessonId::new("l1")).unwrap();
        state.begin_quiz_attempt(&course, &module).unwrap();
        state.record_quiz_result(&course, &module, 40, false).unwrap();

        let events = state.replace_courses(import(CSV));
        assert!(events.is_empty());
        let quiz = state.quiz(&course, &module).unwrap();
        assert_eq!(quiz.best_score, 40);
        assert_eq!(quiz.attempts, 1);
        assert!(quiz.completed);
        assert!(!quiz.passed);
        assert_eq!(state.course(&course).unwrap().completed_lessons, 1);
    }

    #[test]
    fn select_lesson_rejects_unknown_ids() {
        let mut state = LearnerState::default();
        state.replace_courses(import(CSV));
        let (course, module) = ids();
        state
            .select_lesson(&course, &module, &LessonId::new("l1"))
            .unwrap();
        let err = state
            .select_lesson(&course, &ModuleId::new("zz"), &LessonId::new("l1"))
            .unwrap_err();
        assert!(matches!(err, LookupError::Module { .. }));
        assert_eq!(state.selection().lesson, Some(LessonId::new("l1")));
    }

    #[test]
    fn from_parts_overlays_without_events() {
        let mut record = CompletionRecord::new();
        record.complete_lesson(LessonId::new("l1"));
        record.complete_lesson(LessonId::new("l2"));
        record.complete_quiz(QuizId::new("m1-quiz"));
        let mut attempts = QuizAttempts::new();
        attempts.set(QuizId::new("m1-quiz"), 2);

        let state = LearnerState::from_parts(import(CSV), attempts, record);
        let (course, module) = ids();
        assert_eq!(state.quiz(&course, &module).unwrap().attempts, 2);
        assert!(state.module(&course, &module).unwrap().is_complete());
        assert!(!state.module(&course, &ModuleId::new("m2")).unwrap().is_locked);
    }
}
