//! Broadcasting of workflow events for real-time UI updates.

pub mod workflow_events;

pub use workflow_events::{
    AlertKind, EventPayload, WorkflowEvent, WorkflowEventBroadcaster, WorkflowPhase,
};
