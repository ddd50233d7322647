use std::sync::Arc;

use learn_core::import::{
    CourseTreeBuilder, ImportError, ImportOutput, ImportProgress, InteractiveContentSynth,
    LinkVideoUrls, OutlineInteractive, VideoUrlNormalizer,
};
use learn_core::model::{CourseDefaults, CourseId, Lesson, LessonId, ModuleId};
use learn_core::{LearnerState, UnlockEvent};
use storage::LearnerStore;

use crate::error::LearningError;
use crate::notify::{Notifier, Severity};

/// Counts reported after a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub courses: usize,
    pub modules: usize,
    pub lessons: usize,
    pub quizzes: usize,
    pub skipped_rows: usize,
    pub unlocks: Vec<UnlockEvent>,
}

impl ImportSummary {
    fn from_state(state: &LearnerState, skipped_rows: usize, unlocks: Vec<UnlockEvent>) -> Self {
        let modules = state.courses().iter().flat_map(|c| &c.modules);
        Self {
            courses: state.courses().len(),
            modules: modules.clone().count(),
            lessons: modules.clone().map(|m| m.lessons.len()).sum(),
            quizzes: modules.filter(|m| m.quiz.is_some()).count(),
            skipped_rows,
            unlocks,
        }
    }
}

/// Import, navigation and lesson completion over a `LearnerState`.
///
/// Every mutating call persists the learner state before returning.
#[derive(Clone)]
pub struct LearningService {
    store: LearnerStore,
    notifier: Arc<dyn Notifier>,
    videos: Arc<dyn VideoUrlNormalizer>,
    interactive: Arc<dyn InteractiveContentSynth>,
    defaults: CourseDefaults,
}

impl LearningService {
    #[must_use]
    pub fn new(store: LearnerStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            videos: Arc::new(LinkVideoUrls),
            interactive: Arc::new(OutlineInteractive),
            defaults: CourseDefaults::default(),
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: CourseDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn with_collaborators(
        mut self,
        videos: Arc<dyn VideoUrlNormalizer>,
        interactive: Arc<dyn InteractiveContentSynth>,
    ) -> Self {
        self.videos = videos;
        self.interactive = interactive;
        self
    }

    #[must_use]
    pub fn defaults(&self) -> CourseDefaults {
        self.defaults
    }

    /// Rehydrate learner state from the store. Never fails; unreadable values
    /// come back empty.
    pub async fn load(&self) -> LearnerState {
        let snapshot = self.store.load().await;
        let state =
            LearnerState::from_parts(snapshot.courses, snapshot.quiz_attempts, snapshot.completion);
        tracing::info!(courses = state.courses().len(), "learner state loaded");
        state
    }

    /// Replace the course hierarchy with one compiled from CSV text.
    ///
    /// # Errors
    ///
    /// Returns `LearningError::Import` for unusable input and
    /// `LearningError::Storage` if the new state cannot be saved. `state` is
    /// left untouched on any error.
    pub async fn import_csv(
        &self,
        state: &mut LearnerState,
        text: &str,
        progress: &mut (dyn FnMut(ImportProgress) + Send),
    ) -> Result<ImportSummary, LearningError> {
        let output = match self.compile(text, progress) {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(error = %err, "import rejected");
                self.notifier
                    .notify(&format!("Import failed: {err}"), Severity::Error);
                return Err(err.into());
            }
        };

        let mut next = state.clone();
        let unlocks = next.replace_courses(output.courses);
        self.persist(&next).await?;
        *state = next;

        let summary = ImportSummary::from_state(state, output.skipped_rows, unlocks);
        tracing::info!(
            courses = summary.courses,
            modules = summary.modules,
            lessons = summary.lessons,
            quizzes = summary.quizzes,
            skipped_rows = summary.skipped_rows,
            "courses imported"
        );
        if summary.skipped_rows > 0 {
            self.notifier.notify(
                &format!("Skipped {} malformed rows", summary.skipped_rows),
                Severity::Warning,
            );
        }
        self.notifier.notify(
            &format!("Imported {} courses", summary.courses),
            Severity::Success,
        );
        self.announce(&summary.unlocks);
        Ok(summary)
    }

    /// Mark a lesson complete and announce anything it unlocked.
    ///
    /// # Errors
    ///
    /// Returns `LearningError::Lookup` for an unknown lesson,
    /// `LearningError::Locked` when the lesson sits behind a lock and
    /// `LearningError::Storage` if the change cannot be saved. `state` is left
    /// untouched on any error.
    pub async fn complete_lesson(
        &self,
        state: &mut LearnerState,
        lesson_id: &LessonId,
    ) -> Result<Vec<UnlockEvent>, LearningError> {
        let mut next = state.clone();
        let unlocks = match next.complete_lesson(lesson_id) {
            Ok(unlocks) => unlocks,
            Err(err) => {
                tracing::warn!(%lesson_id, error = %err, "lesson completion refused");
                self.notifier.notify(&err.to_string(), Severity::Error);
                return Err(err.into());
            }
        };
        self.persist(&next).await?;
        *state = next;

        tracing::info!(%lesson_id, unlocks = unlocks.len(), "lesson completed");
        self.notifier.notify("Lesson completed!", Severity::Success);
        self.announce(&unlocks);
        Ok(unlocks)
    }

    /// Select a lesson for viewing.
    ///
    /// # Errors
    ///
    /// Returns `LearningError::Lookup` for unknown ids and
    /// `LearningError::Locked` when the course or module is still locked. The
    /// previous selection is kept on error.
    pub fn open_lesson(
        &self,
        state: &mut LearnerState,
        course_id: &CourseId,
        module_id: &ModuleId,
        lesson_id: &LessonId,
    ) -> Result<Lesson, LearningError> {
        let result = Self::select(state, course_id, module_id, lesson_id);
        match &result {
            Ok(lesson) => tracing::debug!(lesson_id = %lesson.id, "lesson opened"),
            Err(err) => self.notifier.notify(&err.to_string(), Severity::Error),
        }
        result
    }

    /// Forget all content and progress, in memory and in the store.
    ///
    /// # Errors
    ///
    /// Returns `LearningError::Storage` if the persisted keys cannot be removed;
    /// the in-memory state is kept in that case.
    pub async fn reset(&self, state: &mut LearnerState) -> Result<(), LearningError> {
        self.store.clear().await?;
        state.reset();
        self.notifier.notify("All progress has been reset", Severity::Info);
        Ok(())
    }

    fn compile(
        &self,
        text: &str,
        progress: &mut (dyn FnMut(ImportProgress) + Send),
    ) -> Result<ImportOutput, ImportError> {
        let builder =
            CourseTreeBuilder::new(self.defaults, self.videos.as_ref(), self.interactive.as_ref());
        let mut rng = rand::rng();
        builder.parse(text, &mut rng, progress)
    }

    fn select(
        state: &mut LearnerState,
        course_id: &CourseId,
        module_id: &ModuleId,
        lesson_id: &LessonId,
    ) -> Result<Lesson, LearningError> {
        let lesson = state.lesson(course_id, module_id, lesson_id)?.clone();
        state.ensure_unlocked(course_id, module_id)?;
        state.select_lesson(course_id, module_id, lesson_id)?;
        Ok(lesson)
    }

    fn announce(&self, unlocks: &[UnlockEvent]) {
        for event in unlocks {
            tracing::info!(%event, "unlocked");
            self.notifier.notify(&event.to_string(), Severity::Success);
        }
    }

    async fn persist(&self, state: &LearnerState) -> Result<(), LearningError> {
        self.store
            .save(state.courses(), state.quiz_attempts(), state.completion())
            .await?;
        Ok(())
    }
}
