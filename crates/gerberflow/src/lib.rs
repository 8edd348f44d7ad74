pub mod batch;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod overrides;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod store;
pub mod workflow;

pub use batch::{
    Classification, ContentSource, FileContent, InMemoryContent, OriginTag, ProcessedFile,
    SourceFile, WorkflowMode,
};
pub use broadcast::{AlertKind, EventPayload, WorkflowEvent, WorkflowEventBroadcaster, WorkflowPhase};
pub use config::{load_config, load_config_from_str, WorkflowConfig};
pub use error::{
    ArchiveError, ConfigError, ContentError, Result, ServiceError, StorageError, WorkflowError,
};
pub use export::{archive_name, ExportArchive, GUIDE_FILE_NAME};
pub use logging::{init_logging, LogFormat};
pub use pipeline::{ClassificationSummary, NON_PLATED_DRILL_NAME, PLATED_DRILL_NAME};
pub use services::{DrillMergeOutcome, FabServices, MappingVariant, ValidationReport};
pub use store::{RunResult, WorkflowSnapshot, WorkflowStore};
pub use workflow::{RunOutcome, RunSummary, Workflow};
