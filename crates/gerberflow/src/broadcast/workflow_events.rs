//! Workflow event broadcaster for progress bars, phase labels and alerts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::batch::OriginTag;

/// Phase the workflow is currently in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    Idle,
    Analyzing,
    Processing,
    Validating,
    Exporting,
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowPhase::Idle => write!(f, "Idle"),
            WorkflowPhase::Analyzing => write!(f, "Analyzing files"),
            WorkflowPhase::Processing => write!(f, "Processing files"),
            WorkflowPhase::Validating => write!(f, "Validating"),
            WorkflowPhase::Exporting => write!(f, "Preparing export"),
        }
    }
}

/// User-facing alert categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    UnsupportedPrimaryTool,
    ValidationFailed,
    DrillMergeWarning,
    ManualCopyFailed,
    RunFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventPayload {
    #[serde(rename_all = "camelCase")]
    Progress { phase: WorkflowPhase, percent: f64 },
    #[serde(rename_all = "camelCase")]
    PhaseChanged {
        phase: WorkflowPhase,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Alert { kind: AlertKind, message: String },
    #[serde(rename_all = "camelCase")]
    RunCompleted {
        run_id: String,
        primary_tool: OriginTag,
        layer_count: u32,
        file_count: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl WorkflowEvent {
    fn now(payload: EventPayload) -> Self {
        Self {
            timestamp: Utc::now(),
            payload,
        }
    }

    pub fn progress(phase: WorkflowPhase, percent: f64) -> Self {
        Self::now(EventPayload::Progress { phase, percent })
    }

    pub fn phase_changed(phase: WorkflowPhase, message: &str) -> Self {
        Self::now(EventPayload::PhaseChanged {
            phase,
            message: message.to_string(),
        })
    }

    pub fn alert(kind: AlertKind, message: &str) -> Self {
        Self::now(EventPayload::Alert {
            kind,
            message: message.to_string(),
        })
    }

    pub fn run_completed(
        run_id: &str,
        primary_tool: OriginTag,
        layer_count: u32,
        file_count: usize,
    ) -> Self {
        Self::now(EventPayload::RunCompleted {
            run_id: run_id.to_string(),
            primary_tool,
            layer_count,
            file_count,
        })
    }
}

/// Broadcasts workflow events to any number of subscribers.
#[derive(Clone)]
pub struct WorkflowEventBroadcaster {
    sender: Arc<broadcast::Sender<WorkflowEvent>>,
}

impl WorkflowEventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: WorkflowEvent) {
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    pub fn progress(&self, phase: WorkflowPhase, percent: f64) {
        self.send(WorkflowEvent::progress(phase, percent));
    }

    pub fn phase_changed(&self, phase: WorkflowPhase, message: &str) {
        self.send(WorkflowEvent::phase_changed(phase, message));
    }

    pub fn alert(&self, kind: AlertKind, message: &str) {
        self.send(WorkflowEvent::alert(kind, message));
    }
}

impl Default for WorkflowEventBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}
