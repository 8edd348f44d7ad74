//! Final packaging: guide injection, archive naming and zip assembly.

pub mod archive;

use std::sync::Arc;

use tracing::debug;

use crate::batch::{OriginTag, ProcessedFile};
use crate::error::Result;
use crate::pipeline::RunContext;
use crate::services::FabServices;

pub use archive::ExportArchive;

/// Name of the generated ordering guide placed in every export.
pub const GUIDE_FILE_NAME: &str = "PCB下单必读.txt";

const ARCHIVE_EXTENSIONS: [&str; 6] = [".tar.gz", ".tgz", ".tar", ".zip", ".rar", ".7z"];

pub struct ExportAssembler {
    services: Arc<dyn FabServices>,
}

impl ExportAssembler {
    pub fn new(services: Arc<dyn FabServices>) -> Self {
        Self { services }
    }

    /// Adds the guide document unless the export set already has one.
    pub async fn inject_guide(&self, ctx: &mut RunContext) -> Result<bool> {
        if ctx.has_export(GUIDE_FILE_NAME) {
            debug!("Guide already present in export set");
            return Ok(false);
        }
        let text = self.services.guide_text().await?;
        ctx.upsert(ProcessedFile::new(GUIDE_FILE_NAME, GUIDE_FILE_NAME, text));
        Ok(true)
    }
}

/// Strips a trailing archive extension, matched case-insensitively.
pub fn base_name(archive_name: &str) -> &str {
    let lower = archive_name.to_ascii_lowercase();
    ARCHIVE_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext) && lower.len() > ext.len())
        .map(|ext| &archive_name[..archive_name.len() - ext.len()])
        .unwrap_or(archive_name)
}

/// `{base}-{suffix}[-L{n}].zip`; `None` for a tool without a suffix.
pub fn archive_name(original: &str, tool: OriginTag, layer_count: u32) -> Option<String> {
    let suffix = tool.archive_suffix()?;
    let base = base_name(original);
    Some(if layer_count > 0 {
        format!("{}-{}-L{}.zip", base, suffix, layer_count)
    } else {
        format!("{}-{}.zip", base, suffix)
    })
}
