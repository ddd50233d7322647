use thiserror::Error;

use crate::import::ImportError;
use crate::model::{CourseId, LessonId, ModuleId, SettingsError};

/// A requested course, module, lesson or quiz is not in the loaded hierarchy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LookupError {
    #[error("course {0} not found")]
    Course(CourseId),

    #[error("module {module_id} not found in course {course_id}")]
    Module {
        course_id: CourseId,
        module_id: ModuleId,
    },

    #[error("lesson {0} not found")]
    Lesson(LessonId),

    #[error("module {0} has no quiz")]
    Quiz(ModuleId),
}

/// The content exists but earlier progress has not unlocked it yet.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LockedError {
    #[error("course \"{0}\" is locked")]
    Course(String),

    #[error("module \"{0}\" is locked")]
    Module(String),
}

/// Why a learner action on a lesson or quiz was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Locked(#[from] LockedError),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
