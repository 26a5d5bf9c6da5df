//! Extraction of external resource records from a state document.
//!
//! Every resource of every module is examined. Resources that cannot be
//! used are skipped, never fatal; each skip is logged and counted by
//! reason in the [`ExtractionReport`].

use std::collections::BTreeMap;
use std::fmt;

use kubestack_common::constants::{DEFAULT_METADATA_TAG, DEFAULT_TAG_PREFIX};
use kubestack_render::{ApplicationResources, ExternalRecord};
use serde::Deserialize;

use crate::error::{Result, StateError};
use crate::registry::KindRegistry;
use crate::state::{ResourceState, SUPPORTED_VERSION, TfState};

/// Tag conventions and recognized kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Tag holding the ownership metadata JSON.
    pub metadata_tag: String,
    /// Attribute prefix of the tag namespace.
    pub tag_prefix: String,
    /// Recognized resource kinds.
    pub registry: KindRegistry,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            metadata_tag: DEFAULT_METADATA_TAG.to_owned(),
            tag_prefix: DEFAULT_TAG_PREFIX.to_owned(),
            registry: KindRegistry::default(),
        }
    }
}

impl ExtractorConfig {
    /// Returns a copy reading metadata from `tag`.
    #[must_use]
    pub fn with_metadata_tag(mut self, tag: impl Into<String>) -> Self {
        self.metadata_tag = tag.into();
        self
    }

    /// Returns a copy with the registry replaced.
    #[must_use]
    pub fn with_registry(mut self, registry: KindRegistry) -> Self {
        self.registry = registry;
        self
    }
}

/// Why a resource was not extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    /// Type not in the registry.
    UnrecognizedKind,
    /// Scheduled for destruction.
    Tainted,
    /// No primary instance.
    MissingPrimary,
    /// No metadata tag; the resource is not meant to be consumed.
    MissingMetadata,
    /// Metadata tag present but not a valid metadata object.
    MalformedMetadata,
    /// An attribute the kind extractor needs is absent.
    MissingAttribute,
    /// The resource record does not have the expected shape.
    MalformedResource,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::UnrecognizedKind => "unrecognized kind",
            Self::Tainted => "tainted",
            Self::MissingPrimary => "missing primary instance",
            Self::MissingMetadata => "missing metadata",
            Self::MalformedMetadata => "malformed metadata",
            Self::MissingAttribute => "missing attribute",
            Self::MalformedResource => "malformed resource",
        };
        f.write_str(text)
    }
}

/// Counts of what an extraction pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Resources turned into records.
    pub extracted: usize,
    /// Skipped resources by reason.
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl ExtractionReport {
    fn skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_default() += 1;
    }

    /// Returns how many resources were skipped for `reason`.
    #[must_use]
    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or_default()
    }

    /// Returns the total number of skipped resources.
    #[must_use]
    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// External records grouped by owning application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedState {
    /// Records by application name.
    pub applications: BTreeMap<String, ApplicationResources>,
    /// What the pass did.
    pub report: ExtractionReport,
}

impl ExtractedState {
    /// Returns the total number of extracted records.
    #[must_use]
    pub fn size(&self) -> usize {
        self.applications.values().map(ApplicationResources::len).sum()
    }

    /// Returns the records of `name`, if any.
    #[must_use]
    pub fn application(&self, name: &str) -> Option<&ApplicationResources> {
        self.applications.get(name)
    }

    /// Returns the only application in the state.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::AmbiguousApplication`] unless exactly one
    /// application is present.
    pub fn single_application(&self) -> Result<(&str, &ApplicationResources)> {
        let mut iter = self.applications.iter();
        match (iter.next(), iter.next()) {
            (Some((name, resources)), None) => Ok((name, resources)),
            _ => Err(StateError::AmbiguousApplication {
                available: self.applications.keys().cloned().collect(),
            }),
        }
    }

    /// Picks the application to render: `requested` if given, else the
    /// only application in the state.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::ApplicationNotFound`] for an unknown requested
    /// name, or [`StateError::AmbiguousApplication`] when none is requested
    /// and the choice is not unique.
    pub fn select(&self, requested: Option<&str>) -> Result<(&str, &ApplicationResources)> {
        match requested {
            Some(name) => self
                .applications
                .get_key_value(name)
                .map(|(k, v)| (k.as_str(), v))
                .ok_or_else(|| StateError::ApplicationNotFound {
                    name: name.to_owned(),
                }),
            None => self.single_application(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResourceMetadata {
    app: String,
    service: Option<String>,
    #[serde(alias = "component_name")]
    resource_name: String,
}

/// Extracts records with the default configuration.
///
/// # Errors
///
/// Returns [`StateError`] if the document is not valid state JSON or has
/// an unsupported version.
pub fn extract_state(raw: &str) -> Result<ExtractedState> {
    extract_state_with(raw, &ExtractorConfig::default())
}

/// Extracts records with the given configuration.
///
/// # Errors
///
/// Returns [`StateError`] if the document is not valid state JSON or has
/// an unsupported version.
pub fn extract_state_with(raw: &str, config: &ExtractorConfig) -> Result<ExtractedState> {
    let state: TfState = serde_json::from_str(raw)?;
    if state.version != SUPPORTED_VERSION {
        return Err(StateError::UnsupportedVersion {
            version: state.version,
            expected: SUPPORTED_VERSION,
        });
    }

    let mut extracted = ExtractedState::default();
    for module in &state.modules {
        let module_path = module.display_path();
        for (address, resource) in module.resource_states() {
            let outcome = resource
                .map_err(|e| {
                    tracing::debug!(%address, error = %e, "undecodable resource record");
                    SkipReason::MalformedResource
                })
                .and_then(|resource| extract_resource(&resource, config));
            match outcome {
                Ok((metadata, record)) => {
                    tracing::debug!(
                        module = %module_path,
                        %address,
                        app = %metadata.app,
                        resource = %record.resource_name,
                        "extracted resource"
                    );
                    extracted
                        .applications
                        .entry(metadata.app)
                        .or_default()
                        .add(metadata.service.as_deref(), record);
                    extracted.report.extracted += 1;
                }
                Err(reason) => {
                    tracing::info!(module = %module_path, %address, %reason, "skipping resource");
                    extracted.report.skip(reason);
                }
            }
        }
    }

    tracing::info!(
        extracted = extracted.report.extracted,
        skipped = extracted.report.total_skipped(),
        applications = extracted.applications.len(),
        "state extraction complete"
    );
    Ok(extracted)
}

fn extract_resource(
    resource: &ResourceState,
    config: &ExtractorConfig,
) -> std::result::Result<(ResourceMetadata, ExternalRecord), SkipReason> {
    let extractor = config
        .registry
        .get(&resource.kind)
        .ok_or(SkipReason::UnrecognizedKind)?;
    let primary = resource.primary.as_ref().ok_or(SkipReason::MissingPrimary)?;
    if primary.tainted {
        return Err(SkipReason::Tainted);
    }

    let tags = primary.tags(&config.tag_prefix);
    let raw_metadata = tags
        .get(&config.metadata_tag)
        .ok_or(SkipReason::MissingMetadata)?;
    let metadata: ResourceMetadata =
        serde_json::from_str(raw_metadata).map_err(|_| SkipReason::MalformedMetadata)?;

    let data = extractor.extract(&primary.attributes).map_err(|attribute| {
        tracing::debug!(kind = %resource.kind, %attribute, "required attribute missing");
        SkipReason::MissingAttribute
    })?;
    let record = ExternalRecord {
        resource_name: metadata.resource_name.clone(),
        data,
    };
    Ok((metadata, record))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::registry::KindExtractor;

    fn db_attributes(metadata: &str) -> serde_json::Value {
        json!({
            "address": "db.example.com",
            "port": "5432",
            "username": "admin",
            "password": "secret",
            "tags.%": "1",
            "tags.pib_metadata": metadata,
        })
    }

    fn state_with(resources: serde_json::Value) -> String {
        json!({
            "version": 3,
            "modules": [{"path": ["root"], "resources": resources}]
        })
        .to_string()
    }

    fn resource(kind: &str, tainted: bool, attributes: serde_json::Value) -> serde_json::Value {
        json!({"type": kind, "primary": {"tainted": tainted, "attributes": attributes}, "deposed": []})
    }

    #[test]
    fn tainted_resource_is_skipped() {
        let raw = state_with(json!({
            "aws_db_instance.old": resource("aws_db_instance", true,
                db_attributes(r#"{"app": "shop", "resource_name": "db"}"#)),
            "aws_db_instance.new": resource("aws_db_instance", false,
                db_attributes(r#"{"app": "shop", "resource_name": "db"}"#)),
        }));
        let extracted = extract_state(&raw).unwrap();
        assert_eq!(extracted.size(), 1);
        assert_eq!(extracted.report.skipped(SkipReason::Tainted), 1);
    }

    #[test]
    fn unrecognized_kind_is_skipped_without_error() {
        let raw = state_with(json!({
            "aws_s3_bucket.assets": resource("aws_s3_bucket", false,
                json!({"tags.pib_metadata": r#"{"app": "shop", "resource_name": "assets"}"#})),
        }));
        let extracted = extract_state(&raw).unwrap();
        assert_eq!(extracted.size(), 0);
        assert_eq!(extracted.report.skipped(SkipReason::UnrecognizedKind), 1);
    }

    #[test]
    fn records_partitioned_by_service() {
        let raw = state_with(json!({
            "aws_db_instance.shared": resource("aws_db_instance", false,
                db_attributes(r#"{"app": "shop", "resource_name": "shared-db"}"#)),
            "aws_db_instance.private": resource("aws_db_instance", false,
                db_attributes(r#"{"app": "shop", "service": "web", "component_name": "db"}"#)),
        }));
        let extracted = extract_state(&raw).unwrap();
        let shop = extracted.application("shop").unwrap();
        assert_eq!(shop.shared_resources.len(), 1);
        assert_eq!(shop.shared_resources[0].resource_name, "shared-db");
        let private = shop.private("web", "db").unwrap();
        assert_eq!(private.data["HOST"], "db.example.com");
        assert_eq!(private.data["USERNAME"], "admin");
    }

    #[test]
    fn metadata_problems_are_counted_separately() {
        let mut no_metadata = db_attributes("");
        let _ = no_metadata.as_object_mut().unwrap().remove("tags.pib_metadata");
        let mut missing_password = db_attributes(r#"{"app": "shop", "resource_name": "db"}"#);
        let _ = missing_password.as_object_mut().unwrap().remove("password");
        let raw = state_with(json!({
            "aws_db_instance.a": resource("aws_db_instance", false, no_metadata),
            "aws_db_instance.b": resource("aws_db_instance", false, db_attributes("not json")),
            "aws_db_instance.c": resource("aws_db_instance", false, missing_password),
            "aws_db_instance.d": {"type": "aws_db_instance", "primary": null},
        }));
        let report = extract_state(&raw).unwrap().report;
        assert_eq!(report.extracted, 0);
        assert_eq!(report.skipped(SkipReason::MissingMetadata), 1);
        assert_eq!(report.skipped(SkipReason::MalformedMetadata), 1);
        assert_eq!(report.skipped(SkipReason::MissingAttribute), 1);
        assert_eq!(report.skipped(SkipReason::MissingPrimary), 1);
        assert_eq!(report.total_skipped(), 4);
    }

    #[test]
    fn malformed_resource_is_skipped_not_fatal() {
        let raw = state_with(json!({
            "aws_db_instance.db": resource("aws_db_instance", false,
                db_attributes(r#"{"app": "shop", "resource_name": "db"}"#)),
            "aws_iam_role.deploy": resource("aws_iam_role", false, json!({"count": 1})),
            "aws_db_instance.nulls": {"type": "aws_db_instance", "primary": {"attributes": null}},
            "aws_db_instance.untyped": {"primary": null},
        }));
        let extracted = extract_state(&raw).unwrap();
        assert_eq!(extracted.size(), 1);
        assert_eq!(extracted.report.skipped(SkipReason::MalformedResource), 3);
        assert_eq!(extracted.report.total_skipped(), 3);
    }

    #[test]
    fn malformed_document_is_fatal() {
        assert!(matches!(
            extract_state("{not json"),
            Err(StateError::Malformed { .. })
        ));
    }

    #[test]
    fn other_versions_are_rejected() {
        let raw = json!({"version": 4, "resources": []}).to_string();
        assert!(matches!(
            extract_state(&raw),
            Err(StateError::UnsupportedVersion { version: 4, .. })
        ));
    }

    #[test]
    fn custom_tag_and_registry() {
        let config = ExtractorConfig::default()
            .with_metadata_tag("owner")
            .with_registry(
                KindRegistry::empty()
                    .with_kind("aws_elasticache_cluster", KindExtractor::default().attribute("HOST", "address")),
            );
        let raw = state_with(json!({
            "aws_elasticache_cluster.cache": resource("aws_elasticache_cluster", false, json!({
                "address": "cache.example.com",
                "tags.owner": r#"{"app": "shop", "resource_name": "cache"}"#,
            })),
        }));
        let extracted = extract_state_with(&raw, &config).unwrap();
        let record = extracted.application("shop").unwrap().shared("cache").unwrap();
        assert_eq!(record.data["HOST"], "cache.example.com");
    }

    #[test]
    fn select_application() {
        let raw = state_with(json!({
            "aws_db_instance.a": resource("aws_db_instance", false,
                db_attributes(r#"{"app": "shop", "resource_name": "db"}"#)),
            "aws_db_instance.b": resource("aws_db_instance", false,
                db_attributes(r#"{"app": "blog", "resource_name": "db"}"#)),
        }));
        let extracted = extract_state(&raw).unwrap();
        assert_eq!(extracted.select(Some("blog")).unwrap().0, "blog");
        assert!(matches!(
            extracted.select(Some("wiki")),
            Err(StateError::ApplicationNotFound { .. })
        ));
        assert!(matches!(
            extracted.select(None),
            Err(StateError::AmbiguousApplication { .. })
        ));
    }

    #[test]
    fn empty_state_has_no_single_application() {
        let extracted = extract_state(&state_with(json!({}))).unwrap();
        assert!(extracted.single_application().is_err());
    }
}
