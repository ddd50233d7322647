//! Materializes the course → module → lesson (+ quiz) tree from CSV rows.

use rand::Rng;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::import::collaborators::{InteractiveContentSynth, VideoUrlNormalizer};
use crate::import::quiz_cell::compile_questions;
use crate::import::tokenizer::{content_lines, split_line};
use crate::model::{
    Course, CourseDefaults, CourseId, Lesson, LessonId, LessonKind, LessonType, Module, ModuleId,
    Quiz, QuizId,
};

/// Rows between two progress reports.
pub const PROGRESS_STRIDE: usize = 100;

/// Spreadsheet exports often prefix UTF-8 files with this.
const BYTE_ORDER_MARK: char = '\u{feff}';

const DEFAULT_COURSE_DURATION: u32 = 60;
const DEFAULT_MODULE_DURATION: u32 = 30;
const DEFAULT_LESSON_DURATION: u32 = 15;
const DEFAULT_ORDER: u32 = 1;
const DEFAULT_DIFFICULTY: &str = "Beginner";
const DEFAULT_CATEGORY: &str = "General";

/// Column names understood by the importer.
pub mod columns {
    pub const COURSE_ID: &str = "course_id";
    pub const COURSE_TITLE: &str = "course_title";
    pub const COURSE_DESCRIPTION: &str = "course_description";
    pub const COURSE_CATEGORY: &str = "course_category";
    pub const ESTIMATED_DURATION: &str = "estimated_duration";
    pub const DIFFICULTY_LEVEL: &str = "difficulty_level";
    pub const PREREQUISITES: &str = "prerequisites";
    pub const MODULE_ID: &str = "module_id";
    pub const MODULE_TITLE: &str = "module_title";
    pub const MODULE_DESCRIPTION: &str = "module_description";
    pub const MODULE_DURATION: &str = "module_duration";
    pub const MODULE_ORDER: &str = "module_order";
    pub const LESSON_ID: &str = "lesson_id";
    pub const LESSON_TITLE: &str = "lesson_title";
    pub const LESSON_CONTENT: &str = "lesson_content";
    pub const LESSON_TYPE: &str = "lesson_type";
    pub const LESSON_DURATION: &str = "lesson_duration";
    pub const LESSON_ORDER: &str = "lesson_order";
    pub const LEARNING_OBJECTIVES: &str = "learning_objectives";
    pub const VIDEO_URL: &str = "video_url";
    pub const QUIZ_QUESTIONS: &str = "quiz_questions";
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImportError {
    #[error("CSV needs a header row and at least one data row (found {lines} non-blank lines)")]
    TooFewLines { lines: usize },

    #[error("CSV header is missing the `{0}` column")]
    MissingColumn(&'static str),

    #[error("CSV contained no usable course rows ({skipped} skipped)")]
    NoCourses { skipped: usize },
}

/// Header name → column position.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    columns: HashMap<String, usize>,
    width: usize,
}

impl HeaderIndex {
    /// Names are matched trimmed and lowercased; the first occurrence wins.
    #[must_use]
    pub fn from_cells(cells: &[String]) -> Self {
        let mut columns = HashMap::with_capacity(cells.len());
        for (idx, name) in cells.iter().enumerate() {
            columns.entry(name.trim().to_ascii_lowercase()).or_insert(idx);
        }
        Self {
            columns,
            width: cells.len(),
        }
    }

    /// Number of header cells; shorter rows are skipped.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    fn cell<'r>(&self, row: &'r [String], name: &str) -> &'r str {
        self.position(name)
            .and_then(|idx| row.get(idx))
            .map_or("", String::as_str)
    }
}

/// Rows consumed so far out of the data rows in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportProgress {
    pub processed: usize,
    pub total: usize,
}

/// Courses in load order plus the number of rows that were ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutput {
    pub courses: Vec<Course>,
    pub skipped_rows: usize,
}

struct ModuleDraft {
    module: Module,
    lesson_ids: HashSet<LessonId>,
}

struct CourseDraft {
    course: Course,
    modules: Vec<ModuleDraft>,
    module_index: HashMap<ModuleId, usize>,
}

/// Builds course trees using the configured defaults and collaborators.
pub struct CourseTreeBuilder<'a> {
    defaults: CourseDefaults,
    videos: &'a dyn VideoUrlNormalizer,
    interactive: &'a dyn InteractiveContentSynth,
}

impl<'a> CourseTreeBuilder<'a> {
    #[must_use]
    pub fn new(
        defaults: CourseDefaults,
        videos: &'a dyn VideoUrlNormalizer,
        interactive: &'a dyn InteractiveContentSynth,
    ) -> Self {
        Self {
            defaults,
            videos,
            interactive,
        }
    }

    /// Validate and tokenize a whole CSV payload, then build the tree.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::TooFewLines` when there is no data row,
    /// `ImportError::MissingColumn` when the header lacks `course_id`, and
    /// `ImportError::NoCourses` when every row was skipped.
    pub fn parse<R: Rng + ?Sized>(
        &self,
        text: &str,
        rng: &mut R,
        progress: &mut dyn FnMut(ImportProgress),
    ) -> Result<ImportOutput, ImportError> {
        let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
        let lines: Vec<&str> = content_lines(text).collect();
        if lines.len() < 2 {
            return Err(ImportError::TooFewLines { lines: lines.len() });
        }

        let header = HeaderIndex::from_cells(&split_line(lines[0]));
        if header.position(columns::COURSE_ID).is_none() {
            return Err(ImportError::MissingColumn(columns::COURSE_ID));
        }

        let rows: Vec<Vec<String>> = lines[1..].iter().map(|line| split_line(line)).collect();
        let output = self.build(&header, &rows, rng, progress);
        if output.courses.is_empty() {
            return Err(ImportError::NoCourses {
                skipped: output.skipped_rows,
            });
        }
        Ok(output)
    }

    /// Build the tree from tokenized data rows.
    pub fn build<R: Rng + ?Sized>(
        &self,
        header: &HeaderIndex,
        rows: &[Vec<String>],
        rng: &mut R,
        progress: &mut dyn FnMut(ImportProgress),
    ) -> ImportOutput {
        let total = rows.len();
        let mut drafts: Vec<CourseDraft> = Vec::new();
        let mut course_index: HashMap<CourseId, usize> = HashMap::new();
        let mut skipped_rows = 0;

        for (idx, row) in rows.iter().enumerate() {
            if !self.apply_row(header, row, &mut drafts, &mut course_index, rng) {
                skipped_rows += 1;
            }
            let processed = idx + 1;
            if processed % PROGRESS_STRIDE == 0 || processed == total {
                progress(ImportProgress { processed, total });
            }
        }

        let courses = drafts
            .into_iter()
            .enumerate()
            .map(|(idx, draft)| finish_course(draft, idx > 0))
            .collect();

        ImportOutput {
            courses,
            skipped_rows,
        }
    }

    /// Returns false when the row was skipped.
    fn apply_row<R: Rng + ?Sized>(
        &self,
        header: &HeaderIndex,
        row: &[String],
        drafts: &mut Vec<CourseDraft>,
        course_index: &mut HashMap<CourseId, usize>,
        rng: &mut R,
    ) -> bool {
        if row.len() < header.width() {
            return false;
        }
        let course_id = header.cell(row, columns::COURSE_ID);
        if course_id.is_empty() {
            return false;
        }

        let course_id = CourseId::new(course_id);
        let draft_idx = *course_index.entry(course_id.clone()).or_insert_with(|| {
            drafts.push(CourseDraft {
                course: new_course(header, row, course_id),
                modules: Vec::new(),
                module_index: HashMap::new(),
            });
            drafts.len() - 1
        });
        let draft = &mut drafts[draft_idx];

        let module_id = header.cell(row, columns::MODULE_ID);
        if module_id.is_empty() {
            return true;
        }
        let module_id = ModuleId::new(module_id);
        let module_idx = *draft.module_index.entry(module_id.clone()).or_insert_with(|| {
            draft.modules.push(ModuleDraft {
                module: new_module(header, row, module_id),
                lesson_ids: HashSet::new(),
            });
            draft.modules.len() - 1
        });
        let module_draft = &mut draft.modules[module_idx];

        let lesson_id = header.cell(row, columns::LESSON_ID);
        if !lesson_id.is_empty() && module_draft.lesson_ids.insert(LessonId::new(lesson_id)) {
            let lesson = self.new_lesson(header, row, LessonId::new(lesson_id));
            module_draft.module.lessons.push(lesson);
        }

        let quiz_cell = header.cell(row, columns::QUIZ_QUESTIONS);
        if !quiz_cell.is_empty() && module_draft.module.quiz.is_none() {
            module_draft.module.quiz = self.new_quiz(&module_draft.module, quiz_cell, rng);
        }
        true
    }

    fn new_lesson(&self, header: &HeaderIndex, row: &[String], id: LessonId) -> Lesson {
        let content = header.cell(row, columns::LESSON_CONTENT).to_owned();
        let lesson_type = LessonType::from_cell(header.cell(row, columns::LESSON_TYPE));
        let kind = match lesson_type {
            LessonType::Video => LessonKind::Video {
                video_url: self.videos.normalize(header.cell(row, columns::VIDEO_URL)),
            },
            LessonType::Reading => LessonKind::Reading,
            LessonType::Review => LessonKind::Review,
            LessonType::Interactive => LessonKind::Interactive {
                interactive_content: self.interactive.synthesize(lesson_type, &content),
            },
            LessonType::Scenario => LessonKind::Scenario {
                interactive_content: self.interactive.synthesize(lesson_type, &content),
            },
            LessonType::Assessment => LessonKind::Assessment {
                interactive_content: self.interactive.synthesize(lesson_type, &content),
            },
        };

        Lesson {
            id,
            title: text_or(header.cell(row, columns::LESSON_TITLE), "Untitled Lesson"),
            content,
            kind,
            duration: leading_number(
                header.cell(row, columns::LESSON_DURATION),
                DEFAULT_LESSON_DURATION,
            ),
            order: leading_number(header.cell(row, columns::LESSON_ORDER), DEFAULT_ORDER),
            objectives: split_objectives(header.cell(row, columns::LEARNING_OBJECTIVES)),
            completed: false,
        }
    }

    fn new_quiz<R: Rng + ?Sized>(&self, module: &Module, cell: &str, rng: &mut R) -> Option<Quiz> {
        let questions = compile_questions(cell, rng);
        if questions.is_empty() {
            return None;
        }
        Some(Quiz {
            id: QuizId::for_module(&module.id),
            title: format!("{} Quiz", module.title),
            questions,
            passing_score: self.defaults.passing_score(),
            time_limit: self.defaults.time_limit_minutes(),
            attempts: 0,
            max_attempts: self.defaults.max_attempts(),
            completed: false,
            passed: false,
            best_score: 0,
        })
    }
}

fn new_course(header: &HeaderIndex, row: &[String], id: CourseId) -> Course {
    Course {
        id,
        title: text_or(header.cell(row, columns::COURSE_TITLE), "Untitled Course"),
        description: header.cell(row, columns::COURSE_DESCRIPTION).to_owned(),
        category: text_or(header.cell(row, columns::COURSE_CATEGORY), DEFAULT_CATEGORY),
        duration: leading_number(
            header.cell(row, columns::ESTIMATED_DURATION),
            DEFAULT_COURSE_DURATION,
        ),
        difficulty: text_or(header.cell(row, columns::DIFFICULTY_LEVEL), DEFAULT_DIFFICULTY),
        prerequisites: header.cell(row, columns::PREREQUISITES).to_owned(),
        modules: Vec::new(),
        total_lessons: 0,
        total_quizzes: 0,
        completed_lessons: 0,
        completed_quizzes: 0,
        is_locked: false,
    }
}

fn new_module(header: &HeaderIndex, row: &[String], id: ModuleId) -> Module {
    Module {
        id,
        title: text_or(header.cell(row, columns::MODULE_TITLE), "Untitled Module"),
        description: header.cell(row, columns::MODULE_DESCRIPTION).to_owned(),
        duration: leading_number(
            header.cell(row, columns::MODULE_DURATION),
            DEFAULT_MODULE_DURATION,
        ),
        order: leading_number(header.cell(row, columns::MODULE_ORDER), DEFAULT_ORDER),
        lessons: Vec::new(),
        quiz: None,
        total_lessons: 0,
        completed_lessons: 0,
        completed_quizzes: 0,
        is_locked: false,
    }
}

fn finish_course(draft: CourseDraft, locked: bool) -> Course {
    let mut course = draft.course;
    let mut modules: Vec<Module> = draft.modules.into_iter().map(|d| d.module).collect();
    // stable: equal orders keep row order
    modules.sort_by_key(|m| m.order);
    for (idx, module) in modules.iter_mut().enumerate() {
        module.lessons.sort_by_key(|l| l.order);
        module.is_locked = idx > 0;
        module.recount();
    }
    course.modules = modules;
    course.is_locked = locked;
    course.recount();
    course
}

fn text_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_owned()
    } else {
        value.to_owned()
    }
}

/// Parses the leading digits of a cell (`"45 min"` → 45).
fn leading_number(raw: &str, default: u32) -> u32 {
    let raw = raw.trim();
    let end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    raw[..end].parse().unwrap_or(default)
}

fn split_objectives(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
