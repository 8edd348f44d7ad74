//! Scripted `FabServices` double.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use gerberflow::{
    DrillMergeOutcome, FabServices, MappingVariant, OriginTag, ServiceError, ValidationReport,
};

pub const HEADER: &str = "G04 Generated header*\n";
pub const FINGERPRINT: &str = "G04 fingerprint*\n";
pub const GUIDE: &str = "Please read before ordering.";

/// Detects origins from marker words (`Altium`, `KiCad`, `EasyEDA`, `BROKEN`
/// fails), sorts names alphabetically unless an order is scripted, prefixes
/// mapped names with `AD_`/`KC_`, and treats `.DRL` names as drills.
pub struct ScriptedServices {
    order: Option<Vec<String>>,
    validation_errors: Vec<String>,
    validation_warnings: Vec<String>,
    merge_warnings: Vec<String>,
    layer_count: u32,
    fail_service: Option<&'static str>,
    hold_validation: Option<Semaphore>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedServices {
    pub fn new() -> Self {
        Self {
            order: None,
            validation_errors: Vec::new(),
            validation_warnings: Vec::new(),
            merge_warnings: Vec::new(),
            layer_count: 2,
            fail_service: None,
            hold_validation: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn order(mut self, names: &[&str]) -> Self {
        self.order = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn layer_count(mut self, count: u32) -> Self {
        self.layer_count = count;
        self
    }

    pub fn invalid(mut self, errors: &[&str]) -> Self {
        self.validation_errors = errors.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn validation_warnings(mut self, warnings: &[&str]) -> Self {
        self.validation_warnings = warnings.iter().map(|w| w.to_string()).collect();
        self
    }

    pub fn merge_warnings(mut self, warnings: &[&str]) -> Self {
        self.merge_warnings = warnings.iter().map(|w| w.to_string()).collect();
        self
    }

    pub fn failing(mut self, service: &'static str) -> Self {
        self.fail_service = Some(service);
        self
    }

    /// Makes `validate` wait until [`release_validation`] is called.
    pub fn hold_validation(mut self) -> Self {
        self.hold_validation = Some(Semaphore::new(0));
        self
    }

    pub fn release_validation(&self) {
        if let Some(gate) = &self.hold_validation {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, service: &str) -> usize {
        self.calls().iter().filter(|c| **c == service).count()
    }

    fn record(&self, service: &'static str) -> Result<(), ServiceError> {
        self.calls.lock().unwrap().push(service);
        if self.fail_service == Some(service) {
            return Err(ServiceError::call(service, "scripted failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl FabServices for ScriptedServices {
    async fn detect_origin(&self, excerpt: &str) -> Result<Option<OriginTag>, ServiceError> {
        self.record("detect_origin")?;
        // Let overlapping classification passes interleave.
        tokio::task::yield_now().await;
        if excerpt.contains("BROKEN") {
            return Err(ServiceError::call("detect_origin", "could not parse excerpt"));
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
        self.record("canonical_sort")?;
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
        self.record("map_filenames")?;
        let prefix = match variant {
            MappingVariant::AltiumStyle => "AD",
            MappingVariant::KiCadStyle => "KC",
        };
        Ok(names
            .iter()
            .filter(|n| !n.to_ascii_uppercase().ends_with(".DRL"))
            .map(|n| (n.clone(), format!("{}_{}", prefix, n)))
            .collect())
    }

    async fn header_text(&self) -> Result<String, ServiceError> {
        self.record("header_text")?;
        Ok(HEADER.to_string())
    }

    async fn normalize_codes(
        &self,
        content: &str,
        altium_codes: bool,
    ) -> Result<String, ServiceError> {
        self.record("normalize_codes")?;
        let convention = if altium_codes { "AD" } else { "STD" };
        Ok(format!("{}G04 codes:{}*\n", content, convention))
    }

    async fn add_fingerprint(&self, content: &str, _foreign: bool) -> Result<String, ServiceError> {
        self.record("add_fingerprint")?;
        Ok(format!("{}{}", content, FINGERPRINT))
    }

    async fn is_drill_file(&self, name: &str) -> Result<bool, ServiceError> {
        self.record("is_drill_file")?;
        Ok(name.to_ascii_uppercase().ends_with(".DRL"))
    }

    async fn merge_drills(
        &self,
        contents: &[String],
        names: &[String],
    ) -> Result<DrillMergeOutcome, ServiceError> {
        self.record("merge_drills")?;
        let mut plated = String::new();
        let mut non_plated = String::new();
        for (name, content) in names.iter().zip(contents) {
            if name.to_ascii_uppercase().contains("NPTH") {
                non_plated.push_str(content);
            } else {
                plated.push_str(content);
            }
        }
        Ok(DrillMergeOutcome {
            plated: (!plated.is_empty()).then_some(plated),
            non_plated: (!non_plated.is_empty()).then_some(non_plated),
            warnings: self.merge_warnings.clone(),
        })
    }

    async fn validate(&self, _export_names: &[String]) -> Result<ValidationReport, ServiceError> {
        self.record("validate")?;
        if let Some(gate) = &self.hold_validation {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| ServiceError::call("validate", e.to_string()))?;
            permit.forget();
        }
        Ok(ValidationReport {
            valid: self.validation_errors.is_empty(),
            errors: self.validation_errors.clone(),
            warnings: self.validation_warnings.clone(),
            layer_count: self.layer_count,
        })
    }

    async fn guide_text(&self) -> Result<String, ServiceError> {
        self.record("guide_text")?;
        Ok(GUIDE.to_string())
    }
}
