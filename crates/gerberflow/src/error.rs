use std::path::PathBuf;
use thiserror::Error;

use crate::batch::OriginTag;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Primary tool '{tag}' is not supported")]
    UnsupportedPrimaryTool { tag: OriginTag },

    #[error("Validation failed: {}", errors.join("; "))]
    ValidationFailed { errors: Vec<String> },

    #[error("Batch is not ready for processing: {pending} file(s) still unclassified")]
    BatchNotReady { pending: usize },

    #[error("No files loaded")]
    EmptyBatch,

    #[error("Unknown file in batch: {0}")]
    UnknownFile(String),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{service} failed: {message}")]
    Call {
        service: &'static str,
        message: String,
    },
}

impl ServiceError {
    pub fn call(service: &'static str, message: impl Into<String>) -> Self {
        Self::Call {
            service,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Failed to read '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Content of '{0}' is not valid text")]
    NotText(String),
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to add '{name}' to archive: {source}")]
    AddEntry {
        name: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to write archive entry '{name}': {source}")]
    WriteEntry {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to finalize archive: {0}")]
    Finish(#[source] zip::result::ZipError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
