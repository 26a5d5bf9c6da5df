//! System-wide constants and defaults.

/// Port a service listens on when the Envfile does not declare one.
pub const DEFAULT_SERVICE_PORT: u16 = 80;

/// Separator between a service name and one of its private requirement
/// names. Never valid inside a name, so identities cannot collide.
pub const PRIVATE_SEPARATOR: &str = "---";

/// Infix of the environment variables wired from configuration records,
/// as in `DB_RESOURCE_HOST`.
pub const RESOURCE_ENV_INFIX: &str = "_RESOURCE_";

/// Default name of the declarative application document.
pub const DEFAULT_ENVFILE: &str = "Envfile.yaml";

/// Label key used to select workloads from network services.
pub const NAME_LABEL: &str = "name";

/// Tag carrying the JSON ownership metadata of a provisioned resource.
pub const DEFAULT_METADATA_TAG: &str = "pib_metadata";

/// Attribute prefix of the flattened tag namespace in provisioning state.
pub const DEFAULT_TAG_PREFIX: &str = "tags.";

/// Prefix of provisioning state locators.
pub const STATE_LOCATOR_PREFIX: &str = "terraform:";

/// Default cluster CLI binary, looked up on `$PATH`.
pub const DEFAULT_KUBECTL: &str = "kubectl";
