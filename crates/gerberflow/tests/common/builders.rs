//! Builders for batches and workflows.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;

use gerberflow::{
    ContentError, ContentSource, EventPayload, SourceFile, Workflow, WorkflowConfig, WorkflowEvent,
};
use tokio::sync::broadcast;

use super::services::ScriptedServices;

pub fn altium_layer(body: &str) -> String {
    format!("G04 Altium Designer*\r\n{}\r\nM02*\r\n", body)
}

pub fn kicad_layer(body: &str) -> String {
    format!("G04 #@! TF.GenerationSoftware,KiCad,Pcbnew*\n{}\nM02*\n", body)
}

pub fn drill(body: &str) -> String {
    format!("M48\r\n{}\r\nM30\r\n", body)
}

/// Content whose every read fails.
pub struct UnreadableContent;

#[async_trait]
impl ContentSource for UnreadableContent {
    async fn read_text(&self) -> Result<String, ContentError> {
        Err(ContentError::NotText("unreadable".to_string()))
    }
}

/// Builder for an uploaded batch.
pub struct BatchBuilder {
    archive_name: String,
    files: Vec<SourceFile>,
}

impl BatchBuilder {
    pub fn new(archive_name: &str) -> Self {
        Self {
            archive_name: archive_name.to_string(),
            files: Vec::new(),
        }
    }

    pub fn file(mut self, name: &str, content: impl Into<String>) -> Self {
        self.files.push(SourceFile::from_text(name, content));
        self
    }

    pub fn unreadable(mut self, name: &str) -> Self {
        self.files.push(SourceFile::new(name, UnreadableContent));
        self
    }

    pub fn load_into(self, workflow: &Workflow) -> String {
        workflow.load_batch(self.archive_name, self.files)
    }
}

/// Four Altium board layers and no drills.
pub fn altium_board() -> BatchBuilder {
    BatchBuilder::new("board.zip")
        .file("board.GBL", altium_layer("bottom"))
        .file("board.GKO", altium_layer("outline"))
        .file("board.GTL", altium_layer("top"))
        .file("board.GTO", altium_layer("silk"))
}

pub fn test_config() -> WorkflowConfig {
    WorkflowConfig {
        classification_concurrency: 2,
        progress_reset_delay_ms: 0,
        ..WorkflowConfig::default()
    }
}

pub fn workflow(services: &Arc<ScriptedServices>) -> Workflow {
    Workflow::new(services.clone(), test_config())
}

/// Loads the batch and classifies it.
pub async fn classified(services: &Arc<ScriptedServices>, batch: BatchBuilder) -> Workflow {
    let workflow = workflow(services);
    batch.load_into(&workflow);
    workflow.classify().await;
    workflow
}

/// Drains every event currently buffered in `rx`.
pub fn drain(rx: &mut broadcast::Receiver<WorkflowEvent>) -> Vec<EventPayload> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event.payload);
    }
    events
}

pub fn alerts(events: &[EventPayload]) -> Vec<(gerberflow::AlertKind, String)> {
    events
        .iter()
        .filter_map(|e| match e {
            EventPayload::Alert { kind, message } => Some((*kind, message.clone())),
            _ => None,
        })
        .collect()
}
