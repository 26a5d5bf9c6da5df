//! Registry of resource kinds that can be extracted.
//!
//! Each recognized resource type maps to a [`KindExtractor`]: a list of
//! output keys and where each value comes from. The registry is data, so
//! callers can extend or replace it without touching extraction logic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Source of one extracted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Copied from the named instance attribute, which must be present.
    Attribute(String),
    /// A fixed value.
    Literal(String),
}

/// Projection of a resource's attributes into record data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindExtractor {
    /// Output key to value source.
    pub fields: BTreeMap<String, ValueSource>,
}

impl KindExtractor {
    /// Returns a copy with `key` copied from attribute `attribute`.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, attribute: impl Into<String>) -> Self {
        let _ = self
            .fields
            .insert(key.into(), ValueSource::Attribute(attribute.into()));
        self
    }

    /// Returns a copy with `key` set to a fixed value.
    #[must_use]
    pub fn literal(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self
            .fields
            .insert(key.into(), ValueSource::Literal(value.into()));
        self
    }

    /// Projects `attributes` into record data.
    ///
    /// # Errors
    ///
    /// Returns the name of the first missing attribute.
    pub fn extract(
        &self,
        attributes: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, String> {
        self.fields
            .iter()
            .map(|(key, source)| {
                let value = match source {
                    ValueSource::Attribute(name) => {
                        attributes.get(name).cloned().ok_or_else(|| name.clone())?
                    }
                    ValueSource::Literal(value) => value.clone(),
                };
                Ok((key.clone(), value))
            })
            .collect()
    }

    /// Relational database: endpoint and credentials.
    #[must_use]
    pub fn database() -> Self {
        Self::default()
            .attribute("HOST", "address")
            .attribute("PORT", "port")
            .attribute("USERNAME", "username")
            .attribute("PASSWORD", "password")
    }

    /// Managed search cluster: HTTP endpoint on port 80.
    #[must_use]
    pub fn search() -> Self {
        Self::default()
            .attribute("HOST", "endpoint")
            .literal("PORT", "80")
    }
}

/// Recognized resource types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindRegistry {
    kinds: BTreeMap<String, KindExtractor>,
}

impl KindRegistry {
    /// Creates a registry recognizing nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    /// Returns a copy recognizing `kind` with the given extractor.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>, extractor: KindExtractor) -> Self {
        let _ = self.kinds.insert(kind.into(), extractor);
        self
    }

    /// Returns the extractor for `kind`, if recognized.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&KindExtractor> {
        self.kinds.get(kind)
    }

    /// Iterates over recognized kind names.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::empty()
            .with_kind("aws_db_instance", KindExtractor::database())
            .with_kind("aws_rds_cluster", KindExtractor::database())
            .with_kind("aws_elasticsearch_domain", KindExtractor::search())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn default_registry_kinds() {
        let registry = KindRegistry::default();
        assert_eq!(
            registry.kinds().collect::<Vec<_>>(),
            vec!["aws_db_instance", "aws_elasticsearch_domain", "aws_rds_cluster"]
        );
        assert!(registry.get("aws_s3_bucket").is_none());
    }

    #[test]
    fn database_projects_credentials() {
        let data = KindExtractor::database()
            .extract(&attrs(&[
                ("address", "db.local"),
                ("port", "5432"),
                ("username", "admin"),
                ("password", "secret"),
                ("engine", "postgres"),
            ]))
            .unwrap();
        assert_eq!(data.len(), 4);
        assert_eq!(data["HOST"], "db.local");
        assert_eq!(data["PASSWORD"], "secret");
    }

    #[test]
    fn search_uses_fixed_port() {
        let data = KindExtractor::search()
            .extract(&attrs(&[("endpoint", "search.local")]))
            .unwrap();
        assert_eq!(data["PORT"], "80");
    }

    #[test]
    fn missing_attribute_is_named() {
        let missing = KindExtractor::database()
            .extract(&attrs(&[("address", "db.local")]))
            .unwrap_err();
        assert_eq!(missing, "password");
    }
}
