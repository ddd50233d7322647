//! Completion overlay and sequential unlocking.
//!
//! Both passes are pure recomputations over the hierarchy: counters are rebuilt
//! from the completion record every call, and lock flags are derived from
//! position plus the previous sibling's completion.

use std::fmt;

use crate::model::{CompletionRecord, Course, CourseId, ModuleId};

/// A module or course that became accessible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockEvent {
    Module {
        course_id: CourseId,
        module_id: ModuleId,
        title: String,
    },
    Course {
        course_id: CourseId,
        title: String,
    },
}

impl fmt::Display for UnlockEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module { title, .. } => write!(f, "Module unlocked: {title}"),
            Self::Course { title, .. } => write!(f, "Course unlocked: {title}"),
        }
    }
}

/// Overlay the completion record onto the hierarchy and rebuild all counters.
pub fn recompute_completion(courses: &mut [Course], record: &CompletionRecord) {
    for course in courses.iter_mut() {
        for module in &mut course.modules {
            for lesson in &mut module.lessons {
                lesson.completed = record.has_lesson(&lesson.id);
            }
            if let Some(quiz) = module.quiz.as_mut() {
                quiz.passed = record.has_quiz(&quiz.id);
                quiz.completed = quiz.completed || quiz.passed;
            }
            module.recount();
        }
        course.recount();
    }
}

/// Derive lock flags and report locked → unlocked transitions.
///
/// Modules unlocked by their predecessor are added to `record.unlocked_modules`;
/// a module already present there stays unlocked without a new event. Counters
/// must be current (see [`recompute_completion`]).
pub fn check_unlocks(courses: &mut [Course], record: &mut CompletionRecord) -> Vec<UnlockEvent> {
    let mut events = Vec::new();
    let mut previous_course_complete = true;

    for (course_idx, course) in courses.iter_mut().enumerate() {
        let mut previous_module_complete = true;
        for (module_idx, module) in course.modules.iter_mut().enumerate() {
            let earned = module_idx > 0 && previous_module_complete;
            let recorded = record.is_module_unlocked(&module.id);
            let first_time = earned && record.unlock_module(module.id.clone());
            let unlocked = module_idx == 0 || earned || recorded;

            if module.is_locked && unlocked && first_time {
                events.push(UnlockEvent::Module {
                    course_id: course.id.clone(),
                    module_id: module.id.clone(),
                    title: module.title.clone(),
                });
            }
            module.is_locked = !unlocked;
            previous_module_complete = module.is_complete();
        }

        let unlocked = course_idx == 0 || previous_course_complete;
        if course.is_locked && unlocked {
            events.push(UnlockEvent::Course {
                course_id: course.id.clone(),
                title: course.title.clone(),
            });
        }
        course.is_locked = !unlocked;
        previous_course_complete = course.is_complete();
    }

    events
}

/// Recompute then unlock, the pass to run after every completion-affecting event.
pub fn reconcile(courses: &mut [Course], record: &mut CompletionRecord) -> Vec<UnlockEvent> {
    recompute_completion(courses, record);
    check_unlocks(courses, record)
}
