use std::collections::BTreeMap;

use crate::batch::file::upsert_by_export_name;
use crate::batch::{OriginTag, ProcessedFile, SourceFile};

/// State threaded through the stages of one processing run.
pub struct RunContext {
    // Input
    pub run_id: String,
    pub batch_id: String,
    pub files: Vec<SourceFile>,

    // Set from PrimaryToolResolver::resolve
    pub primary_tool: Option<OriginTag>,

    // Rename step result
    pub rename_map: BTreeMap<String, String>,

    // Transform + merge output, keyed by export name
    pub processed: Vec<ProcessedFile>,

    // Set by ValidationGate::check once the export set passes
    pub layer_count: Option<u32>,

    // Non-fatal warnings from drill merging and validation
    pub warnings: Vec<String>,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>, batch_id: impl Into<String>, files: Vec<SourceFile>) -> Self {
        Self {
            run_id: run_id.into(),
            batch_id: batch_id.into(),
            files,
            primary_tool: None,
            rename_map: BTreeMap::new(),
            processed: Vec::new(),
            layer_count: None,
            warnings: Vec::new(),
        }
    }

    pub fn upsert(&mut self, file: ProcessedFile) {
        upsert_by_export_name(&mut self.processed, file);
    }

    pub fn export_name_for(&self, name: &str) -> String {
        self.rename_map
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    pub fn export_names(&self) -> Vec<String> {
        self.processed.iter().map(|f| f.export_name.clone()).collect()
    }

    pub fn has_export(&self, export_name: &str) -> bool {
        self.processed.iter().any(|f| f.export_name == export_name)
    }
}
