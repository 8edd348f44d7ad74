use std::sync::Arc;

use tracing::debug;

use crate::batch::{OriginTag, SourceFile};
use crate::error::{Result, ServiceError, WorkflowError};
use crate::services::FabServices;

/// Picks the batch's primary tool: the origin of the canonically first file.
pub struct PrimaryToolResolver {
    services: Arc<dyn FabServices>,
}

impl PrimaryToolResolver {
    pub fn new(services: Arc<dyn FabServices>) -> Self {
        Self { services }
    }

    /// Fails with `UnsupportedPrimaryTool` unless the first file's tag is in
    /// the supported set.
    pub async fn resolve(&self, files: &[SourceFile]) -> Result<OriginTag> {
        if files.is_empty() {
            return Err(WorkflowError::EmptyBatch);
        }

        let names: Vec<String> = files.iter().map(|f| f.name().to_string()).collect();
        let sorted = self.services.canonical_sort(&names).await?;
        let first = sorted.first().ok_or(WorkflowError::EmptyBatch)?;

        let file = files.iter().find(|f| f.name() == first).ok_or_else(|| {
            ServiceError::call(
                "canonical_sort",
                format!("returned '{}' which is not in the batch", first),
            )
        })?;

        let tag = file
            .classification()
            .tag()
            .unwrap_or(OriginTag::Unrecognized);
        debug!(first = %first, tag = %tag, "Resolved primary tool");

        if !tag.is_supported() {
            return Err(WorkflowError::UnsupportedPrimaryTool { tag });
        }
        Ok(tag)
    }
}
