use serde::{Deserialize, Serialize};

use crate::batch::{Classification, OriginTag, ProcessedFile, WorkflowMode};

/// Outcome of the most recent run that passed validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub primary_tool: Option<OriginTag>,
    pub layer_count: Option<u32>,
}

impl RunResult {
    pub fn is_empty(&self) -> bool {
        self.primary_tool.is_none() && self.layer_count.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub name: String,
    pub classification: Classification,
}

/// Point-in-time copy of the store, safe to hand to a UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSnapshot {
    pub mode: WorkflowMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_name: Option<String>,
    pub files: Vec<FileSummary>,
    pub analysis_complete: bool,
    pub processed: Vec<ProcessedFile>,
    pub progress: f64,
    pub is_processing: bool,
    pub run: RunResult,
}

impl WorkflowSnapshot {
    pub fn pending_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.classification.is_pending())
            .count()
    }

    /// Processing may be triggered once every file has a concrete tag.
    pub fn can_process(&self) -> bool {
        self.mode == WorkflowMode::Process
            && !self.files.is_empty()
            && self.pending_count() == 0
            && !self.is_processing
    }
}
