use std::sync::{Arc, Mutex};

use crate::batch::OriginTag;
use crate::broadcast::{AlertKind, WorkflowEvent, WorkflowEventBroadcaster, WorkflowPhase};
use crate::store::WorkflowStore;

/// Events emitted by the pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Phase {
        phase: WorkflowPhase,
        message: String,
    },
    /// Fractional progress inside the current phase.
    Advance {
        phase: WorkflowPhase,
        percent: f64,
    },
    Alert {
        kind: AlertKind,
        message: String,
    },
    Completed {
        run_id: String,
        primary_tool: OriginTag,
        layer_count: u32,
        file_count: usize,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Collects events in memory; handy when asserting on alert text.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn alerts(&self) -> Vec<(AlertKind, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Alert { kind, message } => Some((kind, message)),
                _ => None,
            })
            .collect()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Mirrors progress into the store and fans every event out to subscribers.
/// Progress for a batch that is no longer current is dropped.
pub struct StoreProgress {
    store: Arc<WorkflowStore>,
    events: WorkflowEventBroadcaster,
    batch_id: String,
}

impl StoreProgress {
    pub fn new(
        store: Arc<WorkflowStore>,
        events: WorkflowEventBroadcaster,
        batch_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            events,
            batch_id: batch_id.into(),
        }
    }
}

impl ProgressReporter for StoreProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase { phase, message } => {
                self.events.phase_changed(phase, &message);
            }
            ProgressEvent::Advance { phase, percent } => {
                if self.store.set_progress(&self.batch_id, percent) {
                    self.events.progress(phase, self.store.progress());
                }
            }
            ProgressEvent::Alert { kind, message } => {
                self.events.alert(kind, &message);
            }
            ProgressEvent::Completed {
                run_id,
                primary_tool,
                layer_count,
                file_count,
            } => {
                self.events.send(WorkflowEvent::run_completed(
                    &run_id,
                    primary_tool,
                    layer_count,
                    file_count,
                ));
            }
        }
    }
}

/// Counts completed units of a phase and turns them into a percentage.
#[derive(Debug)]
pub struct PhaseCounter {
    phase: WorkflowPhase,
    total: usize,
    done: usize,
}

impl PhaseCounter {
    pub fn new(phase: WorkflowPhase, total: usize) -> Self {
        Self {
            phase,
            total,
            done: 0,
        }
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.done as f64 / self.total as f64 * 100.0).min(100.0)
    }

    /// Marks one unit done and reports the new percentage.
    pub fn advance(&mut self, progress: &dyn ProgressReporter) {
        self.done += 1;
        progress.report(ProgressEvent::Advance {
            phase: self.phase,
            percent: self.percent(),
        });
    }
}
