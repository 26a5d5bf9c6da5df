//! Canonical identities for requirement-backed resource instances.
//!
//! Shared requirements resolve to one instance named after the requirement
//! alone, however many services use them. Private requirements resolve to
//! one instance per `(service, requirement)` pair, named
//! `<service>---<requirement>`. Names cannot contain `---`, so the two
//! namespaces never collide.

use std::collections::BTreeMap;
use std::fmt;

use kubestack_common::constants::PRIVATE_SEPARATOR;
use kubestack_envfile::{Requirement, ResourceTemplate, System};

/// Identity of one backing resource instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceIdentity {
    service: Option<String>,
    requirement: String,
}

impl ResourceIdentity {
    /// Identity of a shared (application-level) requirement.
    #[must_use]
    pub fn shared(requirement: impl Into<String>) -> Self {
        Self {
            service: None,
            requirement: requirement.into(),
        }
    }

    /// Identity of a private requirement of `service`.
    #[must_use]
    pub fn private(service: impl Into<String>, requirement: impl Into<String>) -> Self {
        Self {
            service: Some(service.into()),
            requirement: requirement.into(),
        }
    }

    /// Returns the owning service, `None` for shared requirements.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    /// Returns the requirement name as declared in the Envfile.
    #[must_use]
    pub fn requirement(&self) -> &str {
        &self.requirement
    }

    /// Returns the object name used for every object backing this identity.
    #[must_use]
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.service {
            Some(service) => write!(f, "{service}{PRIVATE_SEPARATOR}{}", self.requirement),
            None => write!(f, "{}", self.requirement),
        }
    }
}

/// A distinct backing instance with the template it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInstance {
    /// Canonical identity.
    pub identity: ResourceIdentity,
    /// The requirement this instance satisfies.
    pub requirement: Requirement,
    /// The template backing the requirement.
    pub template: ResourceTemplate,
}

/// The minimal set of distinct instances for one system.
#[derive(Debug, Clone, Default)]
pub struct ResourceIndex {
    instances: BTreeMap<ResourceIdentity, ResourceInstance>,
}

impl ResourceIndex {
    /// Resolves every requirement of `system` to its instance.
    ///
    /// Requirements whose template is missing are skipped; validated
    /// systems never contain them.
    #[must_use]
    pub fn resolve(system: &System) -> Self {
        let mut instances = BTreeMap::new();
        for (service, requirement) in system.all_requirements() {
            let identity = service.map_or_else(
                || ResourceIdentity::shared(&requirement.name),
                |s| ResourceIdentity::private(&s.name, &requirement.name),
            );
            let Some(template) = system.environment.templates.get(&requirement.template) else {
                tracing::warn!(%identity, template = %requirement.template, "requirement has no template, skipping");
                continue;
            };
            let _ = instances.insert(
                identity.clone(),
                ResourceInstance {
                    identity,
                    requirement: requirement.clone(),
                    template: template.clone(),
                },
            );
        }
        tracing::debug!(count = instances.len(), "resource identities resolved");
        Self { instances }
    }

    /// Iterates over all instances in identity order.
    pub fn instances(&self) -> impl Iterator<Item = &ResourceInstance> {
        self.instances.values()
    }

    /// Iterates over the instances visible to `service`: every shared
    /// instance plus the service's private ones.
    pub fn for_service<'a>(&'a self, service: &'a str) -> impl Iterator<Item = &'a ResourceInstance> {
        self.instances
            .values()
            .filter(move |i| i.identity.service().is_none_or(|s| s == service))
    }

    /// Returns the instance with the given identity.
    #[must_use]
    pub fn get(&self, identity: &ResourceIdentity) -> Option<&ResourceInstance> {
        self.instances.get(identity)
    }

    /// Returns the number of distinct instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns whether no requirement was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
