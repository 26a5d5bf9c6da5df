//! Serialized Terraform state, version 3.
//!
//! Only the fields extraction reads are decoded; everything else in the
//! document is ignored. Resource records stay raw JSON until
//! [`Module::resource_states`] decodes them one by one, so a single odd
//! record cannot fail the whole document.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// State format version this crate reads.
pub const SUPPORTED_VERSION: u64 = 3;

/// Root of a state document.
#[derive(Debug, Clone, Deserialize)]
pub struct TfState {
    /// State format version.
    pub version: u64,
    /// Modules, each holding resources.
    #[serde(default)]
    pub modules: Vec<Module>,
}

/// One module of the state.
#[derive(Debug, Clone, Deserialize)]
pub struct Module {
    /// Module path, e.g. `["root", "db"]`.
    #[serde(default)]
    pub path: Vec<String>,
    /// Resources keyed by address, e.g. `aws_db_instance.main`.
    #[serde(default)]
    pub resources: BTreeMap<String, Value>,
}

impl Module {
    /// Returns the module path joined with `.`.
    #[must_use]
    pub fn display_path(&self) -> String {
        self.path.join(".")
    }

    /// Decodes each resource record independently, keyed by address.
    pub fn resource_states(
        &self,
    ) -> impl Iterator<Item = (&str, serde_json::Result<ResourceState>)> {
        self.resources
            .iter()
            .map(|(address, raw)| (address.as_str(), ResourceState::deserialize(raw)))
    }
}

/// A resource record.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceState {
    /// Resource type, e.g. `aws_db_instance`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The live instance. Deposed instances are not read.
    pub primary: Option<InstanceState>,
}

/// Attributes of one resource instance.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceState {
    /// Set when the instance is scheduled for destruction.
    #[serde(default)]
    pub tainted: bool,
    /// Flattened attributes, e.g. `tags.name`.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl InstanceState {
    /// Collects attributes under `prefix` into a flat tag map.
    ///
    /// Count entries (`<prefix>%`, `<prefix>#`) are bookkeeping, not tags.
    #[must_use]
    pub fn tags(&self, prefix: &str) -> BTreeMap<String, String> {
        self.attributes
            .iter()
            .filter_map(|(key, value)| {
                let tag = key.strip_prefix(prefix)?;
                (tag != "%" && tag != "#").then(|| (tag.to_owned(), value.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_ignores_unknown_fields_and_deposed() {
        let state: TfState = serde_json::from_str(
            r#"{
                "version": 3,
                "serial": 7,
                "modules": [{
                    "path": ["root", "db"],
                    "outputs": {},
                    "resources": {
                        "aws_db_instance.main": {
                            "type": "aws_db_instance",
                            "primary": {"id": "x", "attributes": {"port": "5432"}, "tainted": false},
                            "deposed": [{"id": "old"}]
                        }
                    }
                }]
            }"#,
        )
        .unwrap();
        let module = &state.modules[0];
        assert_eq!(module.display_path(), "root.db");
        let (address, resource) = module.resource_states().next().unwrap();
        assert_eq!(address, "aws_db_instance.main");
        let resource = resource.unwrap();
        assert_eq!(resource.kind, "aws_db_instance");
        assert_eq!(resource.primary.as_ref().unwrap().attributes["port"], "5432");
    }

    #[test]
    fn odd_resource_fails_alone() {
        let state: TfState = serde_json::from_str(
            r#"{
                "version": 3,
                "modules": [{
                    "resources": {
                        "aws_iam_role.a": {"type": "aws_iam_role", "primary": {"attributes": {"count": 1}}},
                        "aws_iam_role.b": {"primary": null},
                        "aws_iam_role.c": {"type": "aws_iam_role", "primary": {"attributes": null}},
                        "aws_iam_role.d": {"type": "aws_iam_role", "primary": null}
                    }
                }]
            }"#,
        )
        .unwrap();
        let decoded: Vec<(&str, bool)> = state.modules[0]
            .resource_states()
            .map(|(address, resource)| (address, resource.is_ok()))
            .collect();
        assert_eq!(
            decoded,
            vec![
                ("aws_iam_role.a", false),
                ("aws_iam_role.b", false),
                ("aws_iam_role.c", false),
                ("aws_iam_role.d", true),
            ]
        );
    }

    #[test]
    fn tags_skip_count_entries() {
        let instance = InstanceState {
            tainted: false,
            attributes: BTreeMap::from([
                ("tags.%".to_owned(), "2".to_owned()),
                ("tags.#".to_owned(), "2".to_owned()),
                ("tags.owner".to_owned(), "ops".to_owned()),
                ("tags.pib_metadata".to_owned(), "{}".to_owned()),
                ("name".to_owned(), "main".to_owned()),
            ]),
        };
        let tags = instance.tags("tags.");
        assert_eq!(tags.keys().collect::<Vec<_>>(), vec!["owner", "pib_metadata"]);
    }
}
