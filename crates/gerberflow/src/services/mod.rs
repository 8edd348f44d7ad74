//! Boundary to the content-transformation services.
//!
//! The orchestrator treats every call as an opaque, side-effect-free
//! computation. Implementations may wrap an in-process library, a
//! subprocess, or a remote endpoint; only the contract below is fixed.

#[cfg(test)]
pub(crate) mod fake;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::batch::OriginTag;
use crate::error::ServiceError;

/// Filename-mapping rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingVariant {
    /// Extension-based names (`.GTL`, `.GBL`, `.GM1`, ...).
    AltiumStyle,
    /// Layer-name based names (`F_Cu`, `Edge_Cuts`, ...).
    KiCadStyle,
}

/// Result of the batched drill merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrillMergeOutcome {
    /// Consolidated plated through-hole content, if any plated holes exist.
    pub plated: Option<String>,
    /// Consolidated non-plated through-hole content, if any exist.
    pub non_plated: Option<String>,
    /// Non-fatal notes, e.g. for dropped blind/buried via files.
    pub warnings: Vec<String>,
}

impl DrillMergeOutcome {
    pub fn has_plated(&self) -> bool {
        self.plated.is_some()
    }

    pub fn has_non_plated(&self) -> bool {
        self.non_plated.is_some()
    }
}

/// Result of structural validation over the final export names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub layer_count: u32,
}

#[async_trait]
pub trait FabServices: Send + Sync {
    /// Identifies the producing CAD tool from a content excerpt.
    async fn detect_origin(&self, excerpt: &str) -> Result<Option<OriginTag>, ServiceError>;

    /// Returns `names` in canonical order; the first entry decides the
    /// batch's primary tool.
    async fn canonical_sort(&self, names: &[String]) -> Result<Vec<String>, ServiceError>;

    async fn map_filenames(
        &self,
        names: &[String],
        variant: MappingVariant,
    ) -> Result<BTreeMap<String, String>, ServiceError>;

    async fn header_text(&self) -> Result<String, ServiceError>;

    async fn normalize_codes(
        &self,
        content: &str,
        altium_codes: bool,
    ) -> Result<String, ServiceError>;

    async fn add_fingerprint(&self, content: &str, foreign: bool) -> Result<String, ServiceError>;

    async fn is_drill_file(&self, name: &str) -> Result<bool, ServiceError>;

    async fn merge_drills(
        &self,
        contents: &[String],
        names: &[String],
    ) -> Result<DrillMergeOutcome, ServiceError>;

    async fn validate(&self, export_names: &[String]) -> Result<ValidationReport, ServiceError>;

    async fn guide_text(&self) -> Result<String, ServiceError>;
}
