//! # kubestack-envfile
//!
//! Loading of `Envfile.yaml` documents into an immutable application model.
//!
//! Handles:
//! - **Schema**: structural validation of the decoded document.
//! - **Document**: typed decoding into the model.
//! - **Validator**: semantic checks (name collisions, dangling references).
//! - **Model**: services, requirements, templates, and the system root.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

mod document;
pub mod model;
pub mod schema;
pub mod validator;

use std::path::Path;

use kubestack_common::error::{KubestackError, Result};
use serde_json::Value;

pub use crate::model::{
    Application, Environment, ImageRef, Requirement, ResourceTemplate, Service, System,
};
use crate::schema::SchemaValidator;

/// Decodes YAML text into a generic document tree.
///
/// # Errors
///
/// Returns [`KubestackError::Yaml`] if the text is not decodable YAML.
pub fn parse_document(input: &str) -> Result<Value> {
    Ok(serde_yaml::from_str(input)?)
}

/// Runs the structural schema over a decoded document.
///
/// # Errors
///
/// Returns [`KubestackError::Validation`] listing every schema violation,
/// or [`KubestackError::Config`] if the embedded schema cannot be compiled.
pub fn validate_document(document: &Value) -> Result<()> {
    SchemaValidator::envfile()?.validate(document)?;
    Ok(())
}

/// Validates a decoded document and builds its model.
///
/// Runs the structural schema first; only a structurally valid document is
/// decoded and checked semantically.
///
/// # Errors
///
/// Returns [`KubestackError::Validation`] carrying every violation found.
pub fn load_system(document: &Value) -> Result<System> {
    tracing::info!("loading Envfile document");
    validate_document(document)?;
    let system = document::decode(document)?;
    validator::validate(&system)?;
    tracing::info!(
        services = system.application.services.len(),
        shared = system.application.requirements.len(),
        templates = system.environment.templates.len(),
        "Envfile loaded"
    );
    Ok(system)
}

/// Parses and loads an Envfile from its YAML text.
///
/// # Errors
///
/// Returns an error if the text is not YAML or the document is invalid.
pub fn load_system_from_str(input: &str) -> Result<System> {
    load_system(&parse_document(input)?)
}

/// Reads, parses, and loads an Envfile from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not YAML, or is invalid.
pub fn load_system_from_path(path: &Path) -> Result<System> {
    tracing::debug!(path = %path.display(), "reading Envfile");
    let content = std::fs::read_to_string(path).map_err(|e| KubestackError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_system_from_str(&content)
}
