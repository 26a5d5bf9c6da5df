//! Deployment configuration model.
//!
//! Values are layered: built-in defaults, then the opaque `remote`
//! section of the Envfile, then command-line flags applied by the caller.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{KubestackError, Result};
use crate::types::Visibility;

/// Root configuration for a deployment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubestackConfig {
    /// Cluster CLI binary name or path.
    pub kubectl: String,
    /// Cluster context to target; `None` uses the CLI's current context.
    pub context: Option<String>,
    /// Provisioning state locator, e.g. `terraform:file:///tmp/state.json`.
    pub state: Option<String>,
    /// Visibility of service network endpoints.
    pub service_visibility: Visibility,
    /// Tag holding the ownership metadata of provisioned resources.
    pub metadata_tag: String,
}

impl Default for KubestackConfig {
    fn default() -> Self {
        Self {
            kubectl: crate::constants::DEFAULT_KUBECTL.into(),
            context: None,
            state: None,
            service_visibility: Visibility::default(),
            metadata_tag: crate::constants::DEFAULT_METADATA_TAG.into(),
        }
    }
}

impl KubestackConfig {
    /// Overlays the `remote` section of an Envfile.
    ///
    /// Recognized keys are `context` (or its older spelling `address`),
    /// `state`, `visibility`, and `metadata_tag`. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a recognized key holds a value of the wrong type.
    pub fn with_remote(mut self, remote: &Map<String, Value>) -> Result<Self> {
        if let Some(context) = string_field(remote, "context")?.or(string_field(remote, "address")?) {
            self.context = Some(context);
        }
        if let Some(state) = string_field(remote, "state")? {
            self.state = Some(state);
        }
        if let Some(visibility) = string_field(remote, "visibility")? {
            self.service_visibility = visibility.parse()?;
        }
        if let Some(tag) = string_field(remote, "metadata_tag")? {
            self.metadata_tag = tag;
        }
        Ok(self)
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(KubestackError::Config {
            message: format!("remote.{key} must be a string, got {other}"),
        }),
    }
}
