//! Hooks the importer calls out to while materializing lessons.

use url::Url;

use crate::model::{InteractiveContent, LessonType};

/// Turns an authored video link into the URL the player should load.
pub trait VideoUrlNormalizer: Send + Sync {
    /// Returns `None` when the link cannot be used.
    fn normalize(&self, raw: &str) -> Option<String>;
}

/// Builds the activity payload for interactive lesson types.
pub trait InteractiveContentSynth: Send + Sync {
    fn synthesize(&self, lesson_type: LessonType, raw_content: &str) -> InteractiveContent;
}

/// Keeps any absolute URL as written and drops the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkVideoUrls;

impl VideoUrlNormalizer for LinkVideoUrls {
    fn normalize(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Url::parse(raw).ok().map(|_| raw.to_owned())
    }
}

/// Splits lesson content into sentence-sized steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineInteractive;

impl InteractiveContentSynth for OutlineInteractive {
    fn synthesize(&self, lesson_type: LessonType, raw_content: &str) -> InteractiveContent {
        let steps: Vec<String> = raw_content
            .split_inclusive(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        let prompt = steps
            .first()
            .cloned()
            .unwrap_or_else(|| format!("Complete this {} activity", lesson_type.as_str().to_lowercase()));

        InteractiveContent {
            activity: lesson_type.as_str().to_owned(),
            prompt,
            steps,
        }
    }
}
