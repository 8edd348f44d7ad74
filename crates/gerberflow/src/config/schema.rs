use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub version: String,
    /// Upper bound on files classified at the same time.
    #[serde(default = "default_classification_concurrency")]
    pub classification_concurrency: usize,
    /// Lines of each file handed to origin detection.
    #[serde(default = "default_excerpt_lines")]
    pub excerpt_lines: usize,
    #[serde(default = "default_progress_reset_delay_ms")]
    pub progress_reset_delay_ms: u64,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_classification_concurrency() -> usize {
    num_cpus::get()
}

fn default_excerpt_lines() -> usize {
    40
}

fn default_progress_reset_delay_ms() -> u64 {
    300
}

fn default_event_capacity() -> usize {
    256
}

impl WorkflowConfig {
    pub fn progress_reset_delay(&self) -> Duration {
        Duration::from_millis(self.progress_reset_delay_ms)
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            classification_concurrency: default_classification_concurrency(),
            excerpt_lines: default_excerpt_lines(),
            progress_reset_delay_ms: default_progress_reset_delay_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}
