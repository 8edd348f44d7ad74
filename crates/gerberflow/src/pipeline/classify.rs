use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::batch::{OriginTag, SourceFile};
use crate::broadcast::WorkflowPhase;
use crate::services::FabServices;
use crate::store::WorkflowStore;

use super::progress::{PhaseCounter, ProgressEvent, ProgressReporter};

/// Counts from one classification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationSummary {
    /// Files that left `Pending` during this pass.
    pub classified: usize,
    /// Of those, files that ended up `Unrecognized`.
    pub unrecognized: usize,
    pub analysis_complete: bool,
}

/// Tags every pending file of the current batch with its origin tool.
pub struct FileClassifier {
    services: Arc<dyn FabServices>,
    store: Arc<WorkflowStore>,
    concurrency: usize,
    excerpt_lines: usize,
    reset_delay: Duration,
}

impl FileClassifier {
    pub fn new(
        services: Arc<dyn FabServices>,
        store: Arc<WorkflowStore>,
        concurrency: usize,
        excerpt_lines: usize,
        reset_delay: Duration,
    ) -> Self {
        Self {
            services,
            store,
            concurrency: concurrency.max(1),
            excerpt_lines,
            reset_delay,
        }
    }

    /// Classifies the files still pending. Files another pass is already
    /// working on are left to it. Per-file failures become `Unrecognized`;
    /// this never fails as a whole.
    pub async fn classify(&self, progress: &dyn ProgressReporter) -> ClassificationSummary {
        let Some(batch_id) = self.store.batch_id() else {
            return ClassificationSummary::default();
        };

        let claim = self.store.claim_pending(&batch_id);
        if claim.is_empty() {
            debug!(batch_id = %batch_id, "No unclaimed pending files, skipping classification");
            return ClassificationSummary {
                analysis_complete: self.store.snapshot().analysis_complete,
                ..ClassificationSummary::default()
            };
        }

        progress.report(ProgressEvent::Phase {
            phase: WorkflowPhase::Analyzing,
            message: format!("Analyzing {} file(s)...", claim.len()),
        });

        let mut counter = PhaseCounter::new(WorkflowPhase::Analyzing, claim.len());
        let mut summary = ClassificationSummary::default();

        let mut results = stream::iter(claim.files().to_vec())
            .map(|file| async move {
                let tag = self.detect(&file).await;
                (file, tag)
            })
            .buffer_unordered(self.concurrency);

        while let Some((file, tag)) = results.next().await {
            if self.store.set_classification(&batch_id, file.name(), tag) {
                summary.classified += 1;
                if tag == OriginTag::Unrecognized {
                    summary.unrecognized += 1;
                }
            }
            counter.advance(progress);
        }
        drop(claim);

        if self.store.batch_id().as_deref() != Some(batch_id.as_str()) {
            info!(batch_id = %batch_id, "Batch replaced during classification");
            return summary;
        }

        if self.store.pending_files().is_empty() {
            self.store.set_analysis_complete(&batch_id);
            summary.analysis_complete = true;
            info!(
                batch_id = %batch_id,
                classified = summary.classified,
                unrecognized = summary.unrecognized,
                "Classification complete"
            );

            tokio::time::sleep(self.reset_delay).await;
            if self.store.batch_id().as_deref() == Some(batch_id.as_str()) {
                progress.report(ProgressEvent::Advance {
                    phase: WorkflowPhase::Idle,
                    percent: 0.0,
                });
            }
        }

        summary
    }

    async fn detect(&self, file: &SourceFile) -> OriginTag {
        let excerpt = match file.content().read_excerpt(self.excerpt_lines).await {
            Ok(excerpt) => excerpt,
            Err(e) => {
                warn!(file = %file.name(), error = %e, "Failed to read file for classification");
                return OriginTag::Unrecognized;
            }
        };

        match self.services.detect_origin(&excerpt).await {
            Ok(Some(tag)) => tag,
            Ok(None) => {
                debug!(file = %file.name(), "No origin tool detected");
                OriginTag::Unrecognized
            }
            Err(e) => {
                warn!(file = %file.name(), error = %e, "Origin detection failed");
                OriginTag::Unrecognized
            }
        }
    }
}
