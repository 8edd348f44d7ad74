//! The orchestrator facade: owns the store, the services handle, the event
//! broadcaster and the configuration, and sequences every stage.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::batch::{OriginTag, ProcessedFile, SourceFile};
use crate::broadcast::{AlertKind, WorkflowEvent, WorkflowEventBroadcaster, WorkflowPhase};
use crate::config::WorkflowConfig;
use crate::error::{Result, WorkflowError};
use crate::export::{self, ExportArchive};
use crate::overrides::ManualOverrideLayer;
use crate::pipeline::{
    ClassificationSummary, CompletedRun, FileClassifier, Pipeline, ProgressEvent, ProgressReporter, StoreProgress,
};
use crate::services::FabServices;
use crate::store::{BeginRun, WorkflowSnapshot, WorkflowStore};

/// Summary of a run that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: String,
    pub primary_tool: OriginTag,
    pub layer_count: u32,
    pub file_count: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another run held the single-flight slot; nothing happened.
    AlreadyRunning,
    /// The batch was replaced or reset while the run was in flight and its
    /// output was dropped.
    Superseded,
    Completed(RunSummary),
}

pub struct Workflow {
    config: WorkflowConfig,
    store: Arc<WorkflowStore>,
    events: WorkflowEventBroadcaster,
    classifier: FileClassifier,
    pipeline: Pipeline,
    overrides: ManualOverrideLayer,
}

impl Workflow {
    pub fn new(services: Arc<dyn FabServices>, config: WorkflowConfig) -> Self {
        let store = Arc::new(WorkflowStore::new());
        let events = WorkflowEventBroadcaster::new(config.event_capacity.max(1));
        let classifier = FileClassifier::new(
            Arc::clone(&services),
            Arc::clone(&store),
            config.classification_concurrency,
            config.excerpt_lines,
            config.progress_reset_delay(),
        );
        let pipeline = Pipeline::new(services, Arc::clone(&store));
        let overrides = ManualOverrideLayer::new(Arc::clone(&store));

        Self {
            config,
            store,
            events,
            classifier,
            pipeline,
            overrides,
        }
    }

    pub fn with_defaults(services: Arc<dyn FabServices>) -> Self {
        Self::new(services, WorkflowConfig::default())
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<WorkflowStore> {
        &self.store
    }

    pub fn events(&self) -> &WorkflowEventBroadcaster {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.store.snapshot()
    }

    /// Reporter bound to whichever batch is current right now.
    fn reporter(&self) -> StoreProgress {
        let batch_id = self.store.batch_id().unwrap_or_default();
        StoreProgress::new(Arc::clone(&self.store), self.events.clone(), batch_id)
    }

    /// Replaces the batch and switches to process mode. Returns the batch id.
    pub fn load_batch(&self, archive_name: impl Into<String>, files: Vec<SourceFile>) -> String {
        let archive_name = archive_name.into();
        let count = files.len();
        let batch_id = self.store.load_batch(archive_name.clone(), files);
        info!(batch_id = %batch_id, archive = %archive_name, files = count, "Batch loaded");
        batch_id
    }

    pub fn reset(&self) {
        self.store.reset();
        self.events
            .phase_changed(WorkflowPhase::Idle, &WorkflowPhase::Idle.to_string());
        info!("Workflow reset");
    }

    /// Classifies every pending file of the current batch.
    pub async fn classify(&self) -> ClassificationSummary {
        let batch_id = self.store.batch_id().unwrap_or_default();
        let progress = self.reporter();
        self.classifier
            .classify(&progress)
            .instrument(info_span!("classify", batch_id = %batch_id))
            .await
    }

    /// Runs resolution, transformation, validation and guide injection.
    ///
    /// A second call while a run is active returns `AlreadyRunning` without
    /// side effects. Any failure rolls the store back to the pre-run state
    /// and raises an alert before the error is returned.
    pub async fn process(&self) -> Result<RunOutcome> {
        let guard = match self.store.try_begin_run() {
            BeginRun::Started(guard) => guard,
            BeginRun::Busy => {
                debug!("Processing already in progress, ignoring trigger");
                return Ok(RunOutcome::AlreadyRunning);
            }
            BeginRun::NotReady { pending } => return Err(WorkflowError::BatchNotReady { pending }),
            BeginRun::Empty => return Err(WorkflowError::EmptyBatch),
        };

        let span = info_span!(
            "process_run",
            run_id = %guard.run_id(),
            batch_id = %guard.batch_id(),
        );

        async {
            let progress = StoreProgress::new(
                Arc::clone(&self.store),
                self.events.clone(),
                guard.batch_id(),
            );

            let run = match self.pipeline.run(&guard, &progress).await {
                Ok(run) => run,
                Err(e) => {
                    self.store.abort_run(&guard);
                    let (kind, message) = alert_for(&e);
                    match &e {
                        WorkflowError::UnsupportedPrimaryTool { .. }
                        | WorkflowError::ValidationFailed { .. } => warn!(error = %e, "Run rejected"),
                        _ => error!(error = %e, "Run failed"),
                    }
                    progress.report(ProgressEvent::Alert { kind, message });
                    progress.report(ProgressEvent::Phase {
                        phase: WorkflowPhase::Idle,
                        message: WorkflowPhase::Idle.to_string(),
                    });
                    return Err(e);
                }
            };

            let CompletedRun {
                ctx,
                primary_tool,
                layer_count,
            } = run;

            let summary = RunSummary {
                run_id: ctx.run_id.clone(),
                primary_tool,
                layer_count,
                file_count: ctx.processed.len(),
                warnings: ctx.warnings.clone(),
            };

            if !self
                .store
                .complete_run(&guard, ctx.processed, primary_tool, layer_count)
            {
                return Ok(RunOutcome::Superseded);
            }

            info!(
                primary_tool = %primary_tool,
                layer_count,
                files = summary.file_count,
                "Run completed"
            );
            progress.report(ProgressEvent::Completed {
                run_id: summary.run_id.clone(),
                primary_tool,
                layer_count,
                file_count: summary.file_count,
            });
            progress.report(ProgressEvent::Phase {
                phase: WorkflowPhase::Idle,
                message: WorkflowPhase::Idle.to_string(),
            });

            Ok(RunOutcome::Completed(summary))
        }
        .instrument(span)
        .await
    }

    /// Puts a source file's raw content into the export set. See
    /// [`ManualOverrideLayer::copy_raw`].
    pub async fn copy_raw(&self, name: &str) -> Result<Option<ProcessedFile>> {
        let progress = self.reporter();
        self.overrides.copy_raw(name, &progress).await
    }

    pub fn remove_export(&self, original_name: &str) -> usize {
        self.overrides.remove(original_name)
    }

    /// Packages the export set. `Ok(None)` unless an archive name, a
    /// non-empty export set, a primary tool and a layer count are all known.
    pub fn download(&self) -> Result<Option<ExportArchive>> {
        let snapshot = self.store.snapshot();

        let (Some(original), Some(tool), Some(layer_count)) = (
            snapshot.archive_name.as_deref(),
            snapshot.run.primary_tool,
            snapshot.run.layer_count,
        ) else {
            debug!("Download requested before a validated run");
            return Ok(None);
        };
        if snapshot.processed.is_empty() {
            debug!("Download requested with an empty export set");
            return Ok(None);
        }
        let Some(file_name) = export::archive_name(original, tool, layer_count) else {
            return Ok(None);
        };

        let archive = ExportArchive::build(file_name, &snapshot.processed)?;
        info!(
            archive = %archive.file_name,
            files = snapshot.processed.len(),
            bytes = archive.len(),
            "Export archive built"
        );
        Ok(Some(archive))
    }
}

fn alert_for(error: &WorkflowError) -> (AlertKind, String) {
    match error {
        WorkflowError::UnsupportedPrimaryTool { tag } => (
            AlertKind::UnsupportedPrimaryTool,
            format!("Primary tool '{}' is not supported", tag),
        ),
        WorkflowError::ValidationFailed { errors } => (
            AlertKind::ValidationFailed,
            format!("Validation failed:\n{}", errors.join("\n")),
        ),
        other => (AlertKind::RunFailed, other.to_string()),
    }
}
