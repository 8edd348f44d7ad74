use std::sync::Arc;

use tracing::{debug, info, info_span, Instrument};

use crate::batch::OriginTag;
use crate::broadcast::WorkflowPhase;
use crate::error::Result;
use crate::export::ExportAssembler;
use crate::services::FabServices;
use crate::store::{RunGuard, WorkflowStore};

use super::context::RunContext;
use super::progress::{ProgressEvent, ProgressReporter};
use super::resolve::PrimaryToolResolver;
use super::transform::TransformationPipeline;
use super::validate::ValidationGate;

/// A run that passed validation, with the guide already in place.
pub struct CompletedRun {
    pub ctx: RunContext,
    pub primary_tool: OriginTag,
    pub layer_count: u32,
}

/// Sequences one processing run:
/// resolve -> rename -> transform + merge -> validate -> guide.
///
/// The caller owns the run guard and decides between `complete_run` and
/// `abort_run` from the returned result.
pub struct Pipeline {
    store: Arc<WorkflowStore>,
    resolver: PrimaryToolResolver,
    transform: TransformationPipeline,
    gate: ValidationGate,
    assembler: ExportAssembler,
}

impl Pipeline {
    pub fn new(services: Arc<dyn FabServices>, store: Arc<WorkflowStore>) -> Self {
        Self {
            store,
            resolver: PrimaryToolResolver::new(Arc::clone(&services)),
            transform: TransformationPipeline::new(Arc::clone(&services)),
            gate: ValidationGate::new(Arc::clone(&services)),
            assembler: ExportAssembler::new(services),
        }
    }

    pub async fn run(&self, guard: &RunGuard, progress: &dyn ProgressReporter) -> Result<CompletedRun> {
        let mut ctx = RunContext::new(guard.run_id(), guard.batch_id(), self.store.files());

        // Step 1: Resolve primary tool
        let primary = self
            .resolver
            .resolve(&ctx.files)
            .instrument(info_span!("resolve_primary"))
            .await?;
        ctx.primary_tool = Some(primary);
        info!(primary_tool = %primary, files = ctx.files.len(), "Primary tool resolved");

        // Step 2: Rename mapping, published before any content is touched
        progress.report(ProgressEvent::Phase {
            phase: WorkflowPhase::Processing,
            message: format!("Processing {} file(s) as {}...", ctx.files.len(), primary),
        });
        ctx.rename_map = self
            .transform
            .rename_map(&ctx.files, primary)
            .instrument(info_span!("rename"))
            .await?;
        self.store.set_rename_map(&ctx.batch_id, ctx.rename_map.clone());

        // Step 3: Board chain and drill merge
        self.transform
            .run(&mut ctx, progress)
            .instrument(info_span!("transform"))
            .await?;
        debug!(processed = ctx.processed.len(), "Transform finished");

        // Step 4: Validate
        progress.report(ProgressEvent::Advance {
            phase: WorkflowPhase::Validating,
            percent: 0.0,
        });
        progress.report(ProgressEvent::Phase {
            phase: WorkflowPhase::Validating,
            message: "Validating export set...".to_string(),
        });
        let layer_count = self
            .gate
            .check(&mut ctx)
            .instrument(info_span!("validate"))
            .await?;

        // Step 5: Guide document
        progress.report(ProgressEvent::Phase {
            phase: WorkflowPhase::Exporting,
            message: "Preparing export...".to_string(),
        });
        self.assembler
            .inject_guide(&mut ctx)
            .instrument(info_span!("inject_guide"))
            .await?;

        Ok(CompletedRun {
            ctx,
            primary_tool: primary,
            layer_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::SourceFile;
    use crate::error::WorkflowError;
    use crate::export::GUIDE_FILE_NAME;
    use crate::pipeline::progress::RecordingProgress;
    use crate::services::fake::FakeServices;
    use crate::store::BeginRun;

    fn loaded_store(files: &[(&str, &str, OriginTag)]) -> Arc<WorkflowStore> {
        let store = Arc::new(WorkflowStore::new());
        let batch_id = store.load_batch(
            "board.zip",
            files
                .iter()
                .map(|(name, content, _)| SourceFile::from_text(*name, *content))
                .collect(),
        );
        for (name, _, tag) in files {
            store.set_classification(&batch_id, name, *tag);
        }
        store
    }

    fn begin(store: &Arc<WorkflowStore>) -> RunGuard {
        match store.try_begin_run() {
            BeginRun::Started(guard) => guard,
            other => panic!("run should start, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_full_run_produces_guide_and_publishes_rename_map() {
        let store = loaded_store(&[
            ("a.GTL", "top", OriginTag::Altium),
            ("a.GBL", "bottom", OriginTag::Altium),
        ]);
        let pipeline = Pipeline::new(Arc::new(FakeServices::new()), Arc::clone(&store));
        let guard = begin(&store);

        let run = pipeline.run(&guard, &RecordingProgress::new()).await.unwrap();
        let ctx = &run.ctx;

        assert_eq!(run.primary_tool, OriginTag::Altium);
        assert_eq!(run.layer_count, 2);
        assert_eq!(ctx.primary_tool, Some(OriginTag::Altium));
        assert_eq!(ctx.layer_count, Some(2));
        assert_eq!(
            ctx.export_names(),
            vec!["AD_a.GTL", "AD_a.GBL", GUIDE_FILE_NAME]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
        assert_eq!(store.export_name_for("a.GTL"), "AD_a.GTL");
    }

    #[tokio::test]
    async fn test_unsupported_primary_stops_before_rename() {
        let store = loaded_store(&[("a.GTL", "top", OriginTag::Unrecognized)]);
        let pipeline = Pipeline::new(Arc::new(FakeServices::new()), Arc::clone(&store));
        let guard = begin(&store);

        let Err(err) = pipeline.run(&guard, &RecordingProgress::new()).await else {
            panic!("run should be rejected");
        };

        assert!(matches!(err, WorkflowError::UnsupportedPrimaryTool { .. }));
        assert!(store.rename_map().is_empty());
    }
}
