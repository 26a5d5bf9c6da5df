//! # kubestack-tfstate
//!
//! Reads Terraform state and turns tagged, recognized resources into
//! external records for the renderer.
//!
//! A resource is consumed only when its type is in the [`KindRegistry`]
//! and it carries a metadata tag naming its application, optional owning
//! service, and the requirement it satisfies.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod error;
pub mod extract;
pub mod registry;
pub mod state;

pub use crate::error::{Result, StateError};
pub use crate::extract::{
    ExtractedState, ExtractionReport, ExtractorConfig, SkipReason, extract_state,
    extract_state_with,
};
pub use crate::registry::{KindExtractor, KindRegistry};
