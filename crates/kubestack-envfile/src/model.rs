//! Immutable application model built from a validated Envfile.
//!
//! Values are never mutated in place: the `with_*` methods consume a value
//! and return a changed copy, which keeps fixtures and overrides cheap to
//! express without aliasing.

use std::collections::BTreeMap;

use kubestack_common::constants::DEFAULT_SERVICE_PORT;
use serde_json::{Map, Value};

/// A container image split into repository and tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    /// Image repository, e.g. `example/web`.
    pub repository: String,
    /// Image tag, e.g. `1.0`.
    pub tag: String,
}

impl ImageRef {
    /// Creates an image reference.
    #[must_use]
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    /// Returns `repository:tag`.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }

    /// Returns `repository:tag` with the tag replaced.
    #[must_use]
    pub fn reference_with_tag(&self, tag: &str) -> String {
        format!("{}:{tag}", self.repository)
    }
}

/// A runnable resource (database, cache, ...) defined by the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTemplate {
    /// Template name, unique within the environment.
    pub name: String,
    /// Full image reference.
    pub image: String,
    /// Port the resource listens on.
    pub port: u16,
    /// Opaque configuration handed to dependents, without `port`.
    pub config: BTreeMap<String, String>,
}

impl ResourceTemplate {
    /// Creates a template with empty configuration.
    #[must_use]
    pub fn new(name: impl Into<String>, image: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            port,
            config: BTreeMap::new(),
        }
    }

    /// Returns a copy with one configuration entry added or replaced.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.config.insert(key.into(), value.into());
        self
    }
}

/// A named reference to a resource template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    /// Requirement name as seen by the requiring service.
    pub name: String,
    /// Name of the template backing this requirement.
    pub template: String,
}

impl Requirement {
    /// Creates a requirement.
    #[must_use]
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }
}

/// A deployable service of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Service name, unique within the application.
    pub name: String,
    /// Image the service runs.
    pub image: ImageRef,
    /// Port the service listens on.
    pub port: u16,
    /// HTTP path prefix routed to the service, if exposed.
    pub expose_path: Option<String>,
    /// Private requirements, keyed by name.
    pub requirements: BTreeMap<String, Requirement>,
}

impl Service {
    /// Creates an unexposed service on the default port.
    #[must_use]
    pub fn new(name: impl Into<String>, image: ImageRef) -> Self {
        Self {
            name: name.into(),
            image,
            port: DEFAULT_SERVICE_PORT,
            expose_path: None,
            requirements: BTreeMap::new(),
        }
    }

    /// Returns a copy listening on `port`.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Returns a copy exposed under `path`.
    #[must_use]
    pub fn with_expose_path(mut self, path: impl Into<String>) -> Self {
        self.expose_path = Some(path.into());
        self
    }

    /// Returns a copy with a private requirement added or replaced.
    #[must_use]
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        let _ = self
            .requirements
            .insert(requirement.name.clone(), requirement);
        self
    }
}

/// The application: its services and the requirements they share.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Application {
    /// Services keyed by name.
    pub services: BTreeMap<String, Service>,
    /// Shared requirements keyed by name.
    pub requirements: BTreeMap<String, Requirement>,
}

impl Application {
    /// Returns a copy with a service added or replaced.
    #[must_use]
    pub fn with_service(mut self, service: Service) -> Self {
        let _ = self.services.insert(service.name.clone(), service);
        self
    }

    /// Returns a copy with a shared requirement added or replaced.
    #[must_use]
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        let _ = self
            .requirements
            .insert(requirement.name.clone(), requirement);
        self
    }
}

/// The local deployment context: the templates requirements resolve to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Templates keyed by name.
    pub templates: BTreeMap<String, ResourceTemplate>,
}

impl Environment {
    /// Returns a copy with a template added or replaced.
    #[must_use]
    pub fn with_template(mut self, template: ResourceTemplate) -> Self {
        let _ = self.templates.insert(template.name.clone(), template);
        self
    }
}

/// Root of the model loaded from one Envfile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct System {
    /// Resource templates.
    pub environment: Environment,
    /// Services and shared requirements.
    pub application: Application,
    /// The `remote` section, passed through untouched.
    pub remote_config: Map<String, Value>,
}

impl System {
    /// Returns a copy with the environment replaced.
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Returns a copy with the application replaced.
    #[must_use]
    pub fn with_application(mut self, application: Application) -> Self {
        self.application = application;
        self
    }

    /// Returns a copy with the remote configuration replaced.
    #[must_use]
    pub fn with_remote_config(mut self, remote_config: Map<String, Value>) -> Self {
        self.remote_config = remote_config;
        self
    }

    /// Iterates over every requirement with its owning service, `None` for
    /// shared requirements. Shared requirements come first, then services
    /// in name order.
    pub fn all_requirements(&self) -> impl Iterator<Item = (Option<&Service>, &Requirement)> {
        let shared = self
            .application
            .requirements
            .values()
            .map(|r| (None::<&Service>, r));
        let private = self
            .application
            .services
            .values()
            .flat_map(|s| s.requirements.values().map(move |r| (Some(s), r)));
        shared.chain(private)
    }
}
