use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::batch::ProcessedFile;
use crate::error::{ArchiveError, StorageError};
use crate::storage::FileStorage;

/// A finished, in-memory zip of the export set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportArchive {
    /// Writes each file under its export name, deflate-compressed, in the
    /// order given.
    pub fn build(
        file_name: impl Into<String>,
        files: &[ProcessedFile],
    ) -> Result<Self, ArchiveError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for file in files {
            writer
                .start_file(file.export_name.as_str(), options)
                .map_err(|e| ArchiveError::AddEntry {
                    name: file.export_name.clone(),
                    source: e,
                })?;
            writer
                .write_all(file.content.as_bytes())
                .map_err(|e| ArchiveError::WriteEntry {
                    name: file.export_name.clone(),
                    source: e,
                })?;
        }

        let cursor = writer.finish().map_err(ArchiveError::Finish)?;
        Ok(Self {
            file_name: file_name.into(),
            bytes: cursor.into_inner(),
        })
    }

    /// Saves into `directory`; an existing file of the same name gets a
    /// numbered sibling instead of being overwritten.
    pub fn save_to<P: AsRef<Path>>(&self, directory: P) -> Result<PathBuf, StorageError> {
        FileStorage::new(directory).store(&self.bytes, &self.file_name)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
