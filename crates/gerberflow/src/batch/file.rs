use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::content::{ContentSource, FileContent, InMemoryContent};
use super::origin::Classification;

/// One uploaded fabrication file.
#[derive(Clone)]
pub struct SourceFile {
    name: String,
    content: Arc<dyn ContentSource>,
    classification: Classification,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl ContentSource + 'static) -> Self {
        Self {
            name: name.into(),
            content: Arc::new(content),
            classification: Classification::Pending,
        }
    }

    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, InMemoryContent::new(text))
    }

    /// Uses the file name component of `path` as the batch name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, FileContent::new(path))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> Arc<dyn ContentSource> {
        Arc::clone(&self.content)
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub(crate) fn set_classification(&mut self, classification: Classification) {
        self.classification = classification;
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("classification", &self.classification)
            .finish()
    }
}

/// A file in the export set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFile {
    /// Source file name, or a synthetic label for merged/generated files.
    pub original_name: String,
    /// Name inside the export archive. Unique within the export set.
    pub export_name: String,
    pub content: String,
}

impl ProcessedFile {
    pub fn new(
        original_name: impl Into<String>,
        export_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            export_name: export_name.into(),
            content: content.into(),
        }
    }
}

/// Inserts `file`, replacing any entry with the same export name in place.
pub(crate) fn upsert_by_export_name(files: &mut Vec<ProcessedFile>, file: ProcessedFile) {
    match files.iter_mut().find(|f| f.export_name == file.export_name) {
        Some(existing) => *existing = file,
        None => files.push(file),
    }
}

/// Top-level UI gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowMode {
    #[default]
    Upload,
    Process,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_source_file_is_pending() {
        let file = SourceFile::from_text("board.GTL", "G04*");
        assert_eq!(file.name(), "board.GTL");
        assert!(file.classification().is_pending());
    }

    #[test]
    fn test_from_path_uses_file_name() {
        let file = SourceFile::from_path("/tmp/upload/board-F_Cu.gbr");
        assert_eq!(file.name(), "board-F_Cu.gbr");
    }

    #[test]
    fn test_upsert_replaces_same_export_name() {
        let mut files = vec![
            ProcessedFile::new("a.GTL", "Gerber_TopLayer.GTL", "old"),
            ProcessedFile::new("a.GBL", "Gerber_BottomLayer.GBL", "bottom"),
        ];

        upsert_by_export_name(
            &mut files,
            ProcessedFile::new("raw.GTL", "Gerber_TopLayer.GTL", "new"),
        );

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].content, "new");
        assert_eq!(files[0].original_name, "raw.GTL");
    }

    #[test]
    fn test_upsert_appends_new_export_name() {
        let mut files = vec![ProcessedFile::new("a.GTL", "Gerber_TopLayer.GTL", "x")];
        upsert_by_export_name(&mut files, ProcessedFile::new("b.GKO", "Gerber_BoardOutlineLayer.GKO", "y"));
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].export_name, "Gerber_BoardOutlineLayer.GKO");
    }
}
