//! Structural validation of decoded documents against a JSON schema.
//!
//! Every violation is collected in one pass. Objects whose keys are
//! constrained by `patternProperties` get a dedicated message naming the
//! offending key and the patterns it could have matched, instead of the
//! generic "additional properties" failure.

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, Validator};
use kubestack_common::error::{KubestackError, Result, ValidationError, Violation};
use serde_json::Value;

/// The embedded Envfile schema, in YAML.
const ENVFILE_SCHEMA: &str = include_str!("schema.yaml");

/// A compiled schema together with its source document.
pub struct SchemaValidator {
    schema: Value,
    validator: Validator,
}

impl SchemaValidator {
    /// Compiles a draft 4 schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema itself is not a valid JSON schema.
    pub fn new(schema: Value) -> Result<Self> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft4)
            .build(&schema)
            .map_err(|e| KubestackError::Config {
                message: format!("invalid schema: {e}"),
            })?;
        Ok(Self { schema, validator })
    }

    /// Compiles the embedded Envfile schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded schema cannot be decoded or compiled.
    pub fn envfile() -> Result<Self> {
        let schema: Value = serde_yaml::from_str(ENVFILE_SCHEMA)?;
        Self::new(schema)
    }

    /// Returns the schema document.
    #[must_use]
    pub const fn schema(&self) -> &Value {
        &self.schema
    }

    /// Returns every violation of the schema found in `instance`.
    #[must_use]
    pub fn violations(&self, instance: &Value) -> Vec<Violation> {
        let mut violations = Vec::new();
        for error in self.validator.iter_errors(instance) {
            let instance_path = error.instance_path.to_string();
            match &error.kind {
                ValidationErrorKind::AdditionalProperties { unexpected } => {
                    let schema_path = error.schema_path.to_string();
                    let patterns = self.allowed_patterns(&schema_path);
                    for key in unexpected {
                        violations.push(unexpected_key(&instance_path, key, &patterns));
                    }
                }
                _ => violations.push(Violation::new(instance_path, error.to_string())),
            }
        }
        violations
    }

    /// Validates `instance`, reporting all violations at once.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every violation found.
    pub fn validate(&self, instance: &Value) -> std::result::Result<(), ValidationError> {
        let violations = self.violations(instance);
        if !violations.is_empty() {
            tracing::debug!(count = violations.len(), "schema validation failed");
        }
        ValidationError::check(violations)
    }

    /// Looks up the `patternProperties` keys of the object schema owning the
    /// `additionalProperties` keyword at `schema_path`.
    fn allowed_patterns(&self, schema_path: &str) -> Vec<String> {
        let Some(object_path) = schema_path.strip_suffix("/additionalProperties") else {
            return Vec::new();
        };
        self.schema
            .pointer(object_path)
            .and_then(|object| object.get("patternProperties"))
            .and_then(Value::as_object)
            .map(|patterns| patterns.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn unexpected_key(object_path: &str, key: &str, patterns: &[String]) -> Violation {
    let path = format!("{object_path}/{}", escape_pointer_segment(key));
    if patterns.is_empty() {
        return Violation::new(path, format!("'{key}' is not an allowed property"));
    }
    let allowed = patterns
        .iter()
        .map(|p| format!("'{p}'"))
        .collect::<Vec<_>>()
        .join(", ");
    Violation::new(
        path,
        format!("'{key}' does not match any of the allowed patterns: {allowed}"),
    )
}

fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn test_schema() -> SchemaValidator {
        SchemaValidator::new(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "count": {"type": "integer"}
            },
            "required": ["name", "count"]
        }))
        .unwrap()
    }

    #[test]
    fn valid_instance_passes() {
        assert!(test_schema().validate(&json!({"name": "hello", "count": 123})).is_ok());
    }

    #[test]
    fn all_violations_are_reported_together() {
        let err = test_schema().validate(&json!({"name": 123})).unwrap_err();
        assert_eq!(err.len(), 2, "got: {err}");
        let paths: Vec<&str> = err.violations().iter().map(|v| v.path.as_str()).collect();
        assert!(paths.contains(&"/"), "got: {paths:?}");
        assert!(paths.contains(&"/name"), "got: {paths:?}");
        assert!(err.to_string().contains("count"), "got: {err}");
    }

    #[test]
    fn invalid_schema_is_a_config_error() {
        let result = SchemaValidator::new(json!({"type": 12}));
        assert!(matches!(result, Err(KubestackError::Config { .. })));
    }

    #[test]
    fn pattern_mismatch_names_key_and_patterns() {
        let validator = SchemaValidator::new(json!({
            "type": "object",
            "additionalProperties": false,
            "patternProperties": {
                "^[a-z]+$": {"type": "string"},
                "^x-[0-9]+$": {"type": "string"}
            }
        }))
        .unwrap();
        let err = validator.validate(&json!({"ok": "a", "Bad_Key": "b"})).unwrap_err();
        assert_eq!(err.len(), 1, "got: {err}");
        let violation = &err.violations()[0];
        assert_eq!(violation.path, "/Bad_Key");
        assert!(violation.message.contains("'Bad_Key'"), "got: {violation}");
        assert!(violation.message.contains("'^[a-z]+$'"), "got: {violation}");
        assert!(violation.message.contains("'^x-[0-9]+$'"), "got: {violation}");
    }

    #[test]
    fn fixed_shape_object_reports_unexpected_property() {
        let validator = SchemaValidator::new(json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {"a": {"type": "string"}}
        }))
        .unwrap();
        let err = validator.validate(&json!({"a": "x", "b": "y"})).unwrap_err();
        assert_eq!(err.violations()[0].path, "/b");
        assert!(err.violations()[0].message.contains("not an allowed property"));
    }

    #[test]
    fn envfile_schema_compiles() {
        let validator = SchemaValidator::envfile().unwrap();
        assert_eq!(validator.schema()["title"], "Envfile");
    }

    #[test]
    fn envfile_schema_rejects_unrelated_document() {
        let validator = SchemaValidator::envfile().unwrap();
        let err = validator.validate(&json!({"not": "valid"})).unwrap_err();
        assert!(err.len() >= 2, "got: {err}");
    }

    #[test]
    fn envfile_schema_rejects_bad_service_name_with_pattern_message() {
        let validator = SchemaValidator::envfile().unwrap();
        let doc = json!({
            "Envfile-version": 1,
            "local": {"templates": {}},
            "application": {
                "services": {
                    "Web_Frontend": {"image": {"repository": "r", "tag": "1"}}
                }
            }
        });
        let err = validator.validate(&doc).unwrap_err();
        let violation = err
            .violations()
            .iter()
            .find(|v| v.path == "/application/services/Web_Frontend")
            .unwrap();
        assert!(
            violation.message.contains("does not match any of the allowed patterns"),
            "got: {violation}"
        );
        assert!(violation.message.contains("^[a-z0-9]+(-[a-z0-9]+)*$"));
    }

    #[test]
    fn envfile_schema_rejects_double_hyphen_names() {
        let validator = SchemaValidator::envfile().unwrap();
        let doc = json!({
            "Envfile-version": 1,
            "local": {"templates": {}},
            "application": {
                "requires": {"a--b": {"template": "t"}},
                "services": {}
            }
        });
        let err = validator.validate(&doc).unwrap_err();
        assert_eq!(err.violations()[0].path, "/application/requires/a--b");
    }
}
