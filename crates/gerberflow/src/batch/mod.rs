//! Batch data model: uploaded source files, their origin classification, and
//! the processed export set.

pub mod content;
pub mod file;
pub mod origin;

pub use content::{ContentSource, FileContent, InMemoryContent};
pub use file::{ProcessedFile, SourceFile, WorkflowMode};
pub use origin::{Classification, OriginTag};
