//! Classification and processing stages of the workflow.

pub mod classify;
pub mod context;
pub mod progress;
pub mod resolve;
pub mod runner;
pub mod transform;
pub mod validate;

pub use classify::{ClassificationSummary, FileClassifier};
pub use context::RunContext;
pub use progress::{
    PhaseCounter, ProgressEvent, ProgressReporter, RecordingProgress, StoreProgress,
};
pub use resolve::PrimaryToolResolver;
pub use runner::{CompletedRun, Pipeline};
pub use transform::{
    TransformationPipeline, NON_PLATED_DRILL_LABEL, NON_PLATED_DRILL_NAME, PLATED_DRILL_LABEL,
    PLATED_DRILL_NAME,
};
pub use validate::ValidationGate;
