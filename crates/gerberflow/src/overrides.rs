//! Per-file edits of the export set that bypass the pipeline.

use std::sync::Arc;

use log::{info, warn};

use crate::batch::ProcessedFile;
use crate::broadcast::AlertKind;
use crate::error::{Result, WorkflowError};
use crate::pipeline::{ProgressEvent, ProgressReporter};
use crate::store::WorkflowStore;

pub struct ManualOverrideLayer {
    store: Arc<WorkflowStore>,
}

impl ManualOverrideLayer {
    pub fn new(store: Arc<WorkflowStore>) -> Self {
        Self { store }
    }

    /// Copies a source file's raw content into the export set under its
    /// mapped name, replacing whatever held that name.
    ///
    /// A read failure raises a `ManualCopyFailed` alert and returns
    /// `Ok(None)` without touching the export set. So does a reset or a new
    /// batch arriving while the read is in flight, minus the alert.
    pub async fn copy_raw(
        &self,
        name: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<Option<ProcessedFile>> {
        let (Some(batch_id), Some(file)) = (self.store.batch_id(), self.store.find_file(name))
        else {
            return Err(WorkflowError::UnknownFile(name.to_string()));
        };

        let content = match file.content().read_text().await {
            Ok(content) => content,
            Err(e) => {
                warn!("Manual copy of '{}' failed: {}", name, e);
                progress.report(ProgressEvent::Alert {
                    kind: AlertKind::ManualCopyFailed,
                    message: format!("Failed to copy '{}': {}", name, e),
                });
                return Ok(None);
            }
        };

        let export_name = self.store.export_name_for(name);
        let processed = ProcessedFile::new(name, export_name, content);
        if !self.store.upsert_processed(&batch_id, processed.clone()) {
            info!("Dropping copy of '{}': batch {} was replaced", name, batch_id);
            return Ok(None);
        }
        info!("Copied '{}' as '{}'", name, processed.export_name);
        Ok(Some(processed))
    }

    /// Drops every export entry produced from `original_name`.
    pub fn remove(&self, original_name: &str) -> usize {
        let removed = self.store.remove_processed(original_name);
        if removed > 0 {
            info!("Removed {} export entr(ies) for '{}'", removed, original_name);
        }
        removed
    }
}
