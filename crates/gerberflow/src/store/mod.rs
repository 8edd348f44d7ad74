//! Session-scoped workflow state.
//!
//! Every mutation is one of the named transactions below. Each transaction
//! takes the write lock once, updates a coherent set of fields, and releases
//! it before returning; none of them hold the lock across an await point.

pub mod snapshot;

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::batch::file::upsert_by_export_name;
use crate::batch::{Classification, OriginTag, ProcessedFile, SourceFile, WorkflowMode};

pub use snapshot::{FileSummary, RunResult, WorkflowSnapshot};

#[derive(Default)]
struct WorkflowState {
    mode: WorkflowMode,
    batch_id: Option<String>,
    archive_name: Option<String>,
    files: Vec<SourceFile>,
    analysis_complete: bool,
    processed: Vec<ProcessedFile>,
    progress: f64,
    active_run: Option<String>,
    // Pending files a classification pass has taken on
    claimed: HashSet<String>,
    run: RunResult,
    rename_map: BTreeMap<String, String>,
}

impl WorkflowState {
    fn is_current_batch(&self, batch_id: &str) -> bool {
        self.batch_id.as_deref() == Some(batch_id)
    }

    fn clear_run_output(&mut self) {
        self.processed.clear();
        self.run = RunResult::default();
        self.progress = 0.0;
    }
}

/// Result of [`WorkflowStore::try_begin_run`].
#[derive(Debug)]
pub enum BeginRun {
    Started(RunGuard),
    /// Another run holds the single-flight slot.
    Busy,
    /// Some files still await classification.
    NotReady { pending: usize },
    Empty,
}

/// Pending files taken on by one classification pass. Files it never
/// classified become claimable again when it is dropped.
#[derive(Debug)]
pub struct PendingClaim {
    store: Arc<WorkflowStore>,
    batch_id: String,
    files: Vec<SourceFile>,
}

impl PendingClaim {
    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Drop for PendingClaim {
    fn drop(&mut self) {
        self.store.release_claim(&self.batch_id, &self.files);
    }
}

/// Holds the single-flight run slot; releases it when dropped, on every
/// exit path of the run.
#[derive(Debug)]
pub struct RunGuard {
    store: Arc<WorkflowStore>,
    run_id: String,
    batch_id: String,
}

impl RunGuard {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.store.finish_run(&self.run_id);
    }
}

#[derive(Default)]
pub struct WorkflowStore {
    state: RwLock<WorkflowState>,
}

impl std::fmt::Debug for WorkflowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStore").finish_non_exhaustive()
    }
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, WorkflowState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Workflow store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, WorkflowState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Workflow store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    // ─── Transactions ───────────────────────────────────────────────────────

    /// Replaces the batch and enters `Process` mode. Duplicate names keep
    /// their first occurrence. Returns the new batch id.
    pub fn load_batch(&self, archive_name: impl Into<String>, files: Vec<SourceFile>) -> String {
        let batch_id = uuid::Uuid::new_v4().to_string();

        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(files.len());
        for file in files {
            if seen.insert(file.name().to_string()) {
                unique.push(file);
            } else {
                log::warn!("Dropping duplicate file '{}' from batch", file.name());
            }
        }

        let mut state = self.write();
        *state = WorkflowState {
            mode: WorkflowMode::Process,
            batch_id: Some(batch_id.clone()),
            archive_name: Some(archive_name.into()),
            files: unique,
            ..WorkflowState::default()
        };
        batch_id
    }

    /// Returns to `Upload` and clears everything.
    pub fn reset(&self) {
        *self.write() = WorkflowState::default();
    }

    /// Records a file's origin. Applies only while the file is still
    /// pending and the batch is still current.
    pub fn set_classification(&self, batch_id: &str, name: &str, tag: OriginTag) -> bool {
        let mut state = self.write();
        if !state.is_current_batch(batch_id) {
            log::debug!("Ignoring classification for stale batch {}", batch_id);
            return false;
        }
        match state.files.iter_mut().find(|f| f.name() == name) {
            Some(file) if file.classification().is_pending() => {
                file.set_classification(Classification::Classified(tag));
                true
            }
            _ => false,
        }
    }

    pub fn set_analysis_complete(&self, batch_id: &str) {
        let mut state = self.write();
        if state.is_current_batch(batch_id) {
            state.analysis_complete = true;
        }
    }

    /// Takes every pending file no other pass has claimed.
    pub fn claim_pending(self: &Arc<Self>, batch_id: &str) -> PendingClaim {
        let mut state = self.write();
        let mut files = Vec::new();
        if state.is_current_batch(batch_id) {
            let WorkflowState { files: all, claimed, .. } = &mut *state;
            for file in all.iter().filter(|f| f.classification().is_pending()) {
                if claimed.insert(file.name().to_string()) {
                    files.push(file.clone());
                }
            }
        }
        PendingClaim {
            store: Arc::clone(self),
            batch_id: batch_id.to_string(),
            files,
        }
    }

    fn release_claim(&self, batch_id: &str, files: &[SourceFile]) {
        let mut state = self.write();
        if state.is_current_batch(batch_id) {
            for file in files {
                state.claimed.remove(file.name());
            }
        }
    }

    pub fn set_progress(&self, batch_id: &str, percent: f64) -> bool {
        let mut state = self.write();
        if !state.is_current_batch(batch_id) {
            return false;
        }
        state.progress = percent.clamp(0.0, 100.0);
        true
    }

    pub fn set_rename_map(&self, batch_id: &str, map: BTreeMap<String, String>) {
        let mut state = self.write();
        if state.is_current_batch(batch_id) {
            state.rename_map = map;
        }
    }

    /// Claims the single-flight slot and clears the previous run's output.
    pub fn try_begin_run(self: &Arc<Self>) -> BeginRun {
        let mut state = self.write();
        if state.active_run.is_some() {
            return BeginRun::Busy;
        }
        let Some(batch_id) = state.batch_id.clone() else {
            return BeginRun::Empty;
        };
        if state.files.is_empty() {
            return BeginRun::Empty;
        }
        let pending = state
            .files
            .iter()
            .filter(|f| f.classification().is_pending())
            .count();
        if pending > 0 {
            return BeginRun::NotReady { pending };
        }

        let run_id = uuid::Uuid::new_v4().to_string();
        state.active_run = Some(run_id.clone());
        state.clear_run_output();

        BeginRun::Started(RunGuard {
            store: Arc::clone(self),
            run_id,
            batch_id,
        })
    }

    /// Publishes a validated run. Ignored if the batch changed meanwhile.
    pub fn complete_run(
        &self,
        guard: &RunGuard,
        processed: Vec<ProcessedFile>,
        primary_tool: OriginTag,
        layer_count: u32,
    ) -> bool {
        let mut state = self.write();
        if !state.is_current_batch(&guard.batch_id) {
            log::warn!("Discarding result of run {} for a replaced batch", guard.run_id);
            return false;
        }
        state.processed = processed;
        state.run = RunResult {
            primary_tool: Some(primary_tool),
            layer_count: Some(layer_count),
        };
        state.progress = 0.0;
        true
    }

    /// Rolls back to the pre-run state: no output, no run result.
    pub fn abort_run(&self, guard: &RunGuard) {
        let mut state = self.write();
        if state.is_current_batch(&guard.batch_id) {
            state.clear_run_output();
        }
    }

    fn finish_run(&self, run_id: &str) {
        let mut state = self.write();
        if state.active_run.as_deref() == Some(run_id) {
            state.active_run = None;
        }
    }

    /// Inserts or replaces (by export name) one processed file, as long as
    /// `batch_id` is still the current batch.
    pub fn upsert_processed(&self, batch_id: &str, file: ProcessedFile) -> bool {
        let mut state = self.write();
        if !state.is_current_batch(batch_id) {
            log::debug!("Ignoring export entry for stale batch {}", batch_id);
            return false;
        }
        upsert_by_export_name(&mut state.processed, file);
        true
    }

    /// Removes every processed entry with the given original name.
    pub fn remove_processed(&self, original_name: &str) -> usize {
        let mut state = self.write();
        let before = state.processed.len();
        state.processed.retain(|f| f.original_name != original_name);
        before - state.processed.len()
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let state = self.read();
        WorkflowSnapshot {
            mode: state.mode,
            batch_id: state.batch_id.clone(),
            archive_name: state.archive_name.clone(),
            files: state
                .files
                .iter()
                .map(|f| FileSummary {
                    name: f.name().to_string(),
                    classification: f.classification(),
                })
                .collect(),
            analysis_complete: state.analysis_complete,
            processed: state.processed.clone(),
            progress: state.progress,
            is_processing: state.active_run.is_some(),
            run: state.run,
        }
    }

    pub fn mode(&self) -> WorkflowMode {
        self.read().mode
    }

    pub fn batch_id(&self) -> Option<String> {
        self.read().batch_id.clone()
    }

    pub fn archive_name(&self) -> Option<String> {
        self.read().archive_name.clone()
    }

    pub fn files(&self) -> Vec<SourceFile> {
        self.read().files.clone()
    }

    pub fn pending_files(&self) -> Vec<SourceFile> {
        self.read()
            .files
            .iter()
            .filter(|f| f.classification().is_pending())
            .cloned()
            .collect()
    }

    pub fn find_file(&self, name: &str) -> Option<SourceFile> {
        self.read().files.iter().find(|f| f.name() == name).cloned()
    }

    pub fn processed(&self) -> Vec<ProcessedFile> {
        self.read().processed.clone()
    }

    pub fn progress(&self) -> f64 {
        self.read().progress
    }

    pub fn is_processing(&self) -> bool {
        self.read().active_run.is_some()
    }

    pub fn run_result(&self) -> RunResult {
        self.read().run
    }

    pub fn rename_map(&self) -> BTreeMap<String, String> {
        self.read().rename_map.clone()
    }

    pub fn export_name_for(&self, name: &str) -> String {
        self.read()
            .rename_map
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}
