use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a string-backed identifier newtype.
///
/// Content ids come from authored CSV cells, so they are opaque strings rather
/// than generated numbers.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a course, unique within the loaded set.
    CourseId
);
string_id!(
    /// Identifier of a module, unique within its course.
    ModuleId
);
string_id!(
    /// Identifier of a lesson.
    LessonId
);
string_id!(
    /// Identifier of a module quiz.
    QuizId
);
string_id!(
    /// Identifier of a question inside a quiz (`q1`, `q2`, ...).
    QuestionId
);

impl QuizId {
    /// Quiz id derived from its owning module.
    #[must_use]
    pub fn for_module(module_id: &ModuleId) -> Self {
        Self(format!("{module_id}-quiz"))
    }
}

impl QuestionId {
    /// Sequential question id, 1-based.
    #[must_use]
    pub fn nth(position: usize) -> Self {
        Self(format!("q{position}"))
    }
}
