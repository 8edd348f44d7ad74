use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{Result, WorkflowError};
use crate::services::FabServices;

use super::context::RunContext;

/// Runs structural validation over the export names of a finished transform.
pub struct ValidationGate {
    services: Arc<dyn FabServices>,
}

impl ValidationGate {
    pub fn new(services: Arc<dyn FabServices>) -> Self {
        Self { services }
    }

    /// On success stores the reported layer count in `ctx`. An invalid
    /// report becomes `ValidationFailed` carrying every error verbatim.
    pub async fn check(&self, ctx: &mut RunContext) -> Result<u32> {
        let names = ctx.export_names();
        let report = self.services.validate(&names).await?;

        if !report.valid {
            return Err(WorkflowError::ValidationFailed {
                errors: report.errors,
            });
        }

        for warning in &report.warnings {
            warn!(warning = %warning, "Validation warning");
        }
        ctx.warnings.extend(report.warnings);

        info!(layer_count = report.layer_count, files = names.len(), "Validation passed");
        ctx.layer_count = Some(report.layer_count);
        Ok(report.layer_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::ProcessedFile;
    use crate::services::fake::FakeServices;

    #[tokio::test]
    async fn test_valid_report_sets_layer_count() {
        let mut services = FakeServices::new();
        services.layer_count = 4;
        let gate = ValidationGate::new(Arc::new(services));
        let mut ctx = RunContext::new("run", "batch", Vec::new());
        ctx.upsert(ProcessedFile::new("a.GTL", "Gerber_TopLayer.GTL", "x"));

        assert_eq!(gate.check(&mut ctx).await.unwrap(), 4);
        assert_eq!(ctx.layer_count, Some(4));
    }

    #[tokio::test]
    async fn test_invalid_report_lists_every_error() {
        let mut services = FakeServices::new();
        services.validation_errors = vec![
            "Missing board outline".to_string(),
            "Missing top copper".to_string(),
        ];
        let gate = ValidationGate::new(Arc::new(services));
        let mut ctx = RunContext::new("run", "batch", Vec::new());

        let err = gate.check(&mut ctx).await.unwrap_err();
        match err {
            WorkflowError::ValidationFailed { errors } => {
                assert_eq!(errors, vec!["Missing board outline", "Missing top copper"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(ctx.layer_count, None);
    }
}
