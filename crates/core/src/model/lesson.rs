use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::LessonId;

/// Lesson type as authored in the `lesson_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LessonType {
    Video,
    Reading,
    Interactive,
    Scenario,
    Assessment,
    Review,
}

impl LessonType {
    /// Parse a CSV cell, case-insensitively. Unknown or empty values are `Reading`.
    #[must_use]
    pub fn from_cell(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "video" => Self::Video,
            "interactive" => Self::Interactive,
            "scenario" => Self::Scenario,
            "assessment" => Self::Assessment,
            "review" => Self::Review,
            _ => Self::Reading,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Reading => "Reading",
            Self::Interactive => "Interactive",
            Self::Scenario => "Scenario",
            Self::Assessment => "Assessment",
            Self::Review => "Review",
        }
    }
}

impl fmt::Display for LessonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload rendered for interactive, scenario and assessment lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveContent {
    pub activity: String,
    pub prompt: String,
    pub steps: Vec<String>,
}

/// Lesson type together with the payload only that type carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum LessonKind {
    Video {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        video_url: Option<String>,
    },
    Reading,
    Interactive {
        interactive_content: InteractiveContent,
    },
    Scenario {
        interactive_content: InteractiveContent,
    },
    Assessment {
        interactive_content: InteractiveContent,
    },
    Review,
}

impl LessonKind {
    #[must_use]
    pub fn lesson_type(&self) -> LessonType {
        match self {
            Self::Video { .. } => LessonType::Video,
            Self::Reading => LessonType::Reading,
            Self::Interactive { .. } => LessonType::Interactive,
            Self::Scenario { .. } => LessonType::Scenario,
            Self::Assessment { .. } => LessonType::Assessment,
            Self::Review => LessonType::Review,
        }
    }

    #[must_use]
    pub fn video_url(&self) -> Option<&str> {
        match self {
            Self::Video { video_url } => video_url.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn interactive_content(&self) -> Option<&InteractiveContent> {
        match self {
            Self::Interactive {
                interactive_content,
            }
            | Self::Scenario {
                interactive_content,
            }
            | Self::Assessment {
                interactive_content,
            } => Some(interactive_content),
            _ => None,
        }
    }
}

/// A single unit of learning content inside a module.
///
/// Everything but `completed` is fixed at import time; `completed` mirrors the
/// learner's completion record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub content: String,
    pub kind: LessonKind,
    pub duration: u32,
    pub order: u32,
    pub objectives: Vec<String>,
    pub completed: bool,
}

impl Lesson {
    #[must_use]
    pub fn lesson_type(&self) -> LessonType {
        self.kind.lesson_type()
    }
}
