//! CSV → course tree compilation.

pub mod builder;
pub mod collaborators;
pub mod quiz_cell;
pub mod tokenizer;

pub use builder::{
    CourseTreeBuilder, HeaderIndex, ImportError, ImportOutput, ImportProgress, columns,
};
pub use collaborators::{
    InteractiveContentSynth, LinkVideoUrls, OutlineInteractive, VideoUrlNormalizer,
};
pub use quiz_cell::compile_questions;
pub use tokenizer::split_line;
