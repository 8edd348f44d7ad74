use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::batch::{OriginTag, ProcessedFile, SourceFile};
use crate::broadcast::{AlertKind, WorkflowPhase};
use crate::error::{Result, WorkflowError};
use crate::services::FabServices;

use super::context::RunContext;
use super::progress::{PhaseCounter, ProgressEvent, ProgressReporter};

pub const PLATED_DRILL_NAME: &str = "Drill_PTH_Through.DRL";
pub const NON_PLATED_DRILL_NAME: &str = "Drill_NPTH_Through.DRL";
pub const PLATED_DRILL_LABEL: &str = "Merged PTH Drill";
pub const NON_PLATED_DRILL_LABEL: &str = "Merged NPTH Drill";

/// Per-file transformation chain plus drill consolidation.
pub struct TransformationPipeline {
    services: Arc<dyn FabServices>,
}

impl TransformationPipeline {
    pub fn new(services: Arc<dyn FabServices>) -> Self {
        Self { services }
    }

    /// Maps every batch file name into the naming scheme of the primary
    /// tool's family.
    pub async fn rename_map(
        &self,
        files: &[SourceFile],
        primary: OriginTag,
    ) -> Result<BTreeMap<String, String>> {
        let variant = primary
            .mapping_variant()
            .ok_or(WorkflowError::UnsupportedPrimaryTool { tag: primary })?;
        let names: Vec<String> = files.iter().map(|f| f.name().to_string()).collect();
        Ok(self.services.map_filenames(&names, variant).await?)
    }

    /// Transforms board layers and merges drills into `ctx.processed`.
    /// Expects `ctx.primary_tool` and `ctx.rename_map` to be set.
    pub async fn run(&self, ctx: &mut RunContext, progress: &dyn ProgressReporter) -> Result<()> {
        let primary = ctx
            .primary_tool
            .ok_or(WorkflowError::UnsupportedPrimaryTool {
                tag: OriginTag::Unrecognized,
            })?;

        let files = ctx.files.clone();
        let (drills, boards) = self.partition(&files).await?;
        debug!(boards = boards.len(), drills = drills.len(), "Partitioned batch");

        let mut counter = PhaseCounter::new(WorkflowPhase::Processing, files.len());

        if !boards.is_empty() {
            let header = self.services.header_text().await?;
            for file in boards {
                let content = self.transform_board(file, &header, primary).await?;
                let export_name = ctx.export_name_for(file.name());
                ctx.upsert(ProcessedFile::new(file.name(), export_name, content));
                counter.advance(progress);
            }
        }

        if !drills.is_empty() {
            self.merge_drills(ctx, &drills, &mut counter, progress).await?;
        }

        Ok(())
    }

    async fn partition<'a>(
        &self,
        files: &'a [SourceFile],
    ) -> Result<(Vec<&'a SourceFile>, Vec<&'a SourceFile>)> {
        let mut drills = Vec::new();
        let mut boards = Vec::new();
        for file in files {
            if self.services.is_drill_file(file.name()).await? {
                drills.push(file);
            } else {
                boards.push(file);
            }
        }
        Ok((drills, boards))
    }

    /// header (own tag supported) -> code normalization (primary family)
    /// -> fingerprint (own tag supported)
    async fn transform_board(
        &self,
        file: &SourceFile,
        header: &str,
        primary: OriginTag,
    ) -> Result<String> {
        let text = normalize_line_endings(&file.content().read_text().await?);
        let supported = file
            .classification()
            .tag()
            .is_some_and(OriginTag::is_supported);

        let with_header = if supported {
            prepend_header(header, &text)
        } else {
            text
        };

        let normalized = self
            .services
            .normalize_codes(&with_header, primary.uses_altium_codes())
            .await?;

        if supported {
            Ok(self.services.add_fingerprint(&normalized, false).await?)
        } else {
            Ok(normalized)
        }
    }

    async fn merge_drills(
        &self,
        ctx: &mut RunContext,
        drills: &[&SourceFile],
        counter: &mut PhaseCounter,
        progress: &dyn ProgressReporter,
    ) -> Result<()> {
        let mut contents = Vec::with_capacity(drills.len());
        let mut names = Vec::with_capacity(drills.len());
        for file in drills {
            contents.push(normalize_line_endings(&file.content().read_text().await?));
            names.push(file.name().to_string());
            counter.advance(progress);
        }

        let outcome = self.services.merge_drills(&contents, &names).await?;

        for warning in &outcome.warnings {
            warn!(warning = %warning, "Drill merge warning");
            progress.report(ProgressEvent::Alert {
                kind: AlertKind::DrillMergeWarning,
                message: warning.clone(),
            });
        }
        ctx.warnings.extend(outcome.warnings);

        if let Some(plated) = outcome.plated {
            ctx.upsert(ProcessedFile::new(PLATED_DRILL_LABEL, PLATED_DRILL_NAME, plated));
        }
        if let Some(non_plated) = outcome.non_plated {
            ctx.upsert(ProcessedFile::new(
                NON_PLATED_DRILL_LABEL,
                NON_PLATED_DRILL_NAME,
                non_plated,
            ));
        }
        Ok(())
    }
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

fn prepend_header(header: &str, body: &str) -> String {
    if header.is_empty() || header.ends_with('\n') {
        format!("{}{}", header, body)
    } else {
        format!("{}\n{}", header, body)
    }
}
