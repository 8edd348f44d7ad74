//! Deterministic `FabServices` used by the unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{DrillMergeOutcome, FabServices, MappingVariant, ValidationReport};
use crate::batch::OriginTag;
use crate::error::ServiceError;

pub(crate) const HEADER: &str = "G04 header*\n";
pub(crate) const FINGERPRINT: &str = "G04 fingerprint*\n";

/// Detects the origin from a marker word in the excerpt, maps names by
/// prefixing the variant, and treats `.DRL` files as drills.
#[derive(Default)]
pub(crate) struct FakeServices {
    pub order: Option<Vec<String>>,
    pub fail_service: Option<&'static str>,
    pub validation_errors: Vec<String>,
    pub merge_warnings: Vec<String>,
    pub layer_count: u32,
    pub detect_calls: AtomicUsize,
    pub normalize_flags: Mutex<Vec<bool>>,
}

impl FakeServices {
    pub fn new() -> Self {
        Self {
            layer_count: 2,
            ..Self::default()
        }
    }

    fn check(&self, service: &'static str) -> Result<(), ServiceError> {
        if self.fail_service == Some(service) {
            return Err(ServiceError::call(service, "scripted failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl FabServices for FakeServices {
    async fn detect_origin(&self, excerpt: &str) -> Result<Option<OriginTag>, ServiceError> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        self.check("detect_origin")?;
        if excerpt.contains("BROKEN") {
            return Err(ServiceError::call("detect_origin", "unreadable excerpt"));
        }
        Ok(if excerpt.contains("Altium") {
            Some(OriginTag::Altium)
        } else if excerpt.contains("KiCad") {
            Some(OriginTag::KiCad)
        } else if excerpt.contains("EasyEDA") {
            Some(OriginTag::EasyEda)
        } else {
            None
        })
    }

    async fn canonical_sort(&self, names: &[String]) -> Result<Vec<String>, ServiceError> {
        self.check("canonical_sort")?;
        if let Some(order) = &self.order {
            return Ok(order.clone());
        }
        let mut sorted = names.to_vec();
        sorted.sort();
        Ok(sorted)
    }

    async fn map_filenames(
        &self,
        names: &[String],
        variant: MappingVariant,
    ) -> Result<BTreeMap<String, String>, ServiceError> {
        self.check("map_filenames")?;
        let prefix = match variant {
            MappingVariant::AltiumStyle => "AD",
            MappingVariant::KiCadStyle => "KC",
        };
        Ok(names
            .iter()
            .map(|n| (n.clone(), format!("{}_{}", prefix, n)))
            .collect())
    }

    async fn header_text(&self) -> Result<String, ServiceError> {
        self.check("header_text")?;
        Ok(HEADER.to_string())
    }

    async fn normalize_codes(&self, content: &str, altium_codes: bool) -> Result<String, ServiceError> {
        self.check("normalize_codes")?;
        if let Ok(mut flags) = self.normalize_flags.lock() {
            flags.push(altium_codes);
        }
        Ok(content.to_string())
    }

    async fn add_fingerprint(&self, content: &str, _foreign: bool) -> Result<String, ServiceError> {
        self.check("add_fingerprint")?;
        Ok(format!("{}{}", content, FINGERPRINT))
    }

    async fn is_drill_file(&self, name: &str) -> Result<bool, ServiceError> {
        self.check("is_drill_file")?;
        Ok(name.to_ascii_uppercase().ends_with(".DRL"))
    }

    async fn merge_drills(
        &self,
        contents: &[String],
        names: &[String],
    ) -> Result<DrillMergeOutcome, ServiceError> {
        self.check("merge_drills")?;
        let (npth, pth): (Vec<_>, Vec<_>) = names
            .iter()
            .zip(contents)
            .partition(|(name, _)| name.to_ascii_uppercase().contains("NPTH"));
        let join = |part: Vec<(&String, &String)>| {
            (!part.is_empty()).then(|| part.into_iter().map(|(_, c)| c.as_str()).collect::<String>())
        };
        Ok(DrillMergeOutcome {
            plated: join(pth),
            non_plated: join(npth),
            warnings: self.merge_warnings.clone(),
        })
    }

    async fn validate(&self, _export_names: &[String]) -> Result<ValidationReport, ServiceError> {
        self.check("validate")?;
        Ok(ValidationReport {
            valid: self.validation_errors.is_empty(),
            errors: self.validation_errors.clone(),
            warnings: Vec::new(),
            layer_count: self.layer_count,
        })
    }

    async fn guide_text(&self) -> Result<String, ServiceError> {
        self.check("guide_text")?;
        Ok("Read before ordering".to_string())
    }
}
