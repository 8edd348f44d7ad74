//! Shared test utilities for gerberflow integration tests.
//!
//! This module provides:
//! - `ScriptedServices`, a deterministic `FabServices` double that records calls
//! - Builders for batches and workflows

pub mod builders;
pub mod services;

pub use builders::*;
pub use services::ScriptedServices;
