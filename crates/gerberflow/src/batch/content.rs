use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::ContentError;

/// Lazily readable text behind a source file.
///
/// Every read is a suspension point and may fail independently; callers
/// decide whether a failure is contained (classification, manual copy) or
/// aborts a run (transformation).
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn read_text(&self) -> Result<String, ContentError>;

    /// Reads at most `max_lines` lines. Implementations backed by large
    /// files should stop reading early.
    async fn read_excerpt(&self, max_lines: usize) -> Result<String, ContentError> {
        let text = self.read_text().await?;
        Ok(first_lines(&text, max_lines))
    }
}

pub(crate) fn first_lines(text: &str, max_lines: usize) -> String {
    text.lines().take(max_lines).collect::<Vec<_>>().join("\n")
}

/// Content already held in memory, e.g. an entry extracted from an upload.
#[derive(Debug, Clone)]
pub struct InMemoryContent {
    text: String,
}

impl InMemoryContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl ContentSource for InMemoryContent {
    async fn read_text(&self) -> Result<String, ContentError> {
        Ok(self.text.clone())
    }
}

/// Content read from disk on demand.
#[derive(Debug, Clone)]
pub struct FileContent {
    path: PathBuf,
}

impl FileContent {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_error(&self, source: std::io::Error) -> ContentError {
        ContentError::Read {
            name: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl ContentSource for FileContent {
    async fn read_text(&self) -> Result<String, ContentError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| self.read_error(e))?;
        String::from_utf8(bytes).map_err(|_| ContentError::NotText(self.path.display().to_string()))
    }

    async fn read_excerpt(&self, max_lines: usize) -> Result<String, ContentError> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| self.read_error(e))?;
        let mut lines = BufReader::new(file).lines();

        let mut excerpt = Vec::with_capacity(max_lines);
        while excerpt.len() < max_lines {
            match lines.next_line().await.map_err(|e| self.read_error(e))? {
                Some(line) => excerpt.push(line),
                None => break,
            }
        }
        Ok(excerpt.join("\n"))
    }
}
