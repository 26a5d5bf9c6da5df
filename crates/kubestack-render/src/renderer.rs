//! Rendering of a validated system into orchestration objects.
//!
//! Rendering is a pure function of the system, the external resources of
//! its application, the tag overrides and the rendering options. Identical
//! inputs always produce an identical [`RenderPlan`], which is what makes
//! re-applying a plan idempotent.

use std::collections::{BTreeMap, BTreeSet};

use kubestack_common::constants::RESOURCE_ENV_INFIX;
use kubestack_common::error::Result;
use kubestack_common::types::Visibility;
use kubestack_envfile::{Service, System};
use serde_json::Value;

use crate::external::{ApplicationResources, ExternalRecord};
use crate::identity::{ResourceIdentity, ResourceIndex, ResourceInstance};
use crate::objects::{
    ConfigRecord, ConfigSource, EnvVar, NetworkService, ObjectKey, ObjectKind, RenderedObject,
    Route, Workload,
};

/// Image tag overrides, keyed by service name.
pub type TagOverrides = BTreeMap<String, String>;

/// Options controlling how objects are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderingOptions {
    /// Reachability of the application's own services. Resource instances
    /// are always cluster-local.
    pub service_visibility: Visibility,
}

impl RenderingOptions {
    /// Creates options with the given service visibility.
    #[must_use]
    pub const fn new(service_visibility: Visibility) -> Self {
        Self { service_visibility }
    }
}

/// The complete output of one render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderPlan {
    objects: BTreeMap<ObjectKey, RenderedObject>,
    removals: BTreeSet<ObjectKey>,
}

impl RenderPlan {
    fn insert(&mut self, object: RenderedObject) {
        let _ = self.objects.insert(object.key(), object);
    }

    /// Returns the object with the given key.
    #[must_use]
    pub fn get(&self, key: &ObjectKey) -> Option<&RenderedObject> {
        self.objects.get(key)
    }

    /// Returns whether an object with the given kind and name was rendered.
    #[must_use]
    pub fn contains(&self, kind: ObjectKind, name: &str) -> bool {
        self.objects.contains_key(&ObjectKey::new(kind, name))
    }

    /// Iterates over all objects in apply order.
    pub fn iter(&self) -> impl Iterator<Item = &RenderedObject> {
        self.objects.values()
    }

    /// Iterates over the objects of one kind, by name.
    pub fn of_kind(&self, kind: ObjectKind) -> impl Iterator<Item = &RenderedObject> {
        self.objects
            .iter()
            .filter(move |(k, _)| k.kind == kind)
            .map(|(_, o)| o)
    }

    /// Returns the number of rendered objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns whether nothing was rendered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects that must be actively deleted because they are no longer
    /// desired.
    #[must_use]
    pub const fn removals(&self) -> &BTreeSet<ObjectKey> {
        &self.removals
    }

    /// Returns every manifest in apply order.
    #[must_use]
    pub fn manifests(&self) -> Vec<Value> {
        self.objects.values().map(RenderedObject::to_manifest).collect()
    }

    /// Serializes every manifest into one multi-document YAML stream.
    ///
    /// # Errors
    ///
    /// Returns [`kubestack_common::error::KubestackError::Yaml`] if a
    /// manifest cannot be serialized.
    pub fn to_yaml(&self) -> Result<String> {
        let mut out = String::new();
        for manifest in self.manifests() {
            out.push_str("---\n");
            out.push_str(&serde_yaml::to_string(&manifest)?);
        }
        Ok(out)
    }
}

/// Renders `system` into a plan.
///
/// `resources` holds the external records of the system's application;
/// a record matching a requirement replaces its in-cluster instance.
#[must_use]
pub fn render(
    system: &System,
    resources: &ApplicationResources,
    overrides: &TagOverrides,
    options: &RenderingOptions,
) -> RenderPlan {
    let index = ResourceIndex::resolve(system);
    let mut plan = RenderPlan::default();
    let mut records: BTreeMap<ResourceIdentity, ConfigRecord> = BTreeMap::new();

    for instance in index.instances() {
        let record = match external_record(resources, &instance.identity) {
            Some(external) => {
                tracing::debug!(identity = %instance.identity, "using external resource");
                retire_instance(&mut plan, instance);
                external_config_record(instance, external)
            }
            None => render_instance(&mut plan, instance),
        };
        plan.insert(RenderedObject::ConfigRecord(record.clone()));
        let _ = records.insert(instance.identity.clone(), record);
    }
    warn_unmatched(system, resources);

    for service in system.application.services.values() {
        let env = service_env(&index, &records, &service.name);
        render_service(&mut plan, service, env, overrides, options);
    }

    tracing::info!(
        objects = plan.len(),
        removals = plan.removals.len(),
        "render complete"
    );
    plan
}

fn external_record<'a>(
    resources: &'a ApplicationResources,
    identity: &ResourceIdentity,
) -> Option<&'a ExternalRecord> {
    match identity.service() {
        Some(service) => resources.private(service, identity.requirement()),
        None => resources.shared(identity.requirement()),
    }
}

/// Schedules removal of the in-cluster workload and network service an
/// external record supersedes.
fn retire_instance(plan: &mut RenderPlan, instance: &ResourceInstance) {
    let name = instance.identity.name();
    for kind in [ObjectKind::Workload, ObjectKind::NetworkService] {
        let _ = plan.removals.insert(ObjectKey::new(kind, &name));
    }
}

fn external_config_record(instance: &ResourceInstance, external: &ExternalRecord) -> ConfigRecord {
    ConfigRecord {
        name: instance.identity.name(),
        resource_name: instance.requirement.name.clone(),
        source: ConfigSource::External,
        data: external.data.clone(),
    }
}

/// Emits the workload and network service backing an in-cluster instance
/// and returns its config record.
fn render_instance(plan: &mut RenderPlan, instance: &ResourceInstance) -> ConfigRecord {
    let name = instance.identity.name();
    let template = &instance.template;
    plan.insert(RenderedObject::Workload(Workload {
        name: name.clone(),
        image: template.image.clone(),
        port: template.port,
        env: Vec::new(),
    }));
    plan.insert(RenderedObject::NetworkService(NetworkService {
        name: name.clone(),
        port: template.port,
        visibility: Visibility::ClusterLocal,
    }));

    let mut data = template.config.clone();
    let _ = data.insert("host".to_owned(), name.clone());
    let _ = data.insert("port".to_owned(), template.port.to_string());
    ConfigRecord {
        name,
        resource_name: instance.requirement.name.clone(),
        source: ConfigSource::Internal,
        data,
    }
}

fn service_env(
    index: &ResourceIndex,
    records: &BTreeMap<ResourceIdentity, ConfigRecord>,
    service: &str,
) -> Vec<EnvVar> {
    let mut visible: Vec<&ConfigRecord> = index
        .for_service(service)
        .filter_map(|i| records.get(&i.identity))
        .collect();
    visible.sort_by(|a, b| a.resource_name.cmp(&b.resource_name));

    visible
        .into_iter()
        .flat_map(|record| {
            record.data.keys().map(move |key| EnvVar {
                name: env_var_name(&record.resource_name, key),
                config_record: record.name.clone(),
                key: key.clone(),
            })
        })
        .collect()
}

/// Returns `<REQUIREMENT>_RESOURCE_<KEY>` for a requirement data key.
#[must_use]
pub fn env_var_name(requirement: &str, key: &str) -> String {
    format!(
        "{}{RESOURCE_ENV_INFIX}{}",
        requirement.to_uppercase().replace('-', "_"),
        key.to_uppercase()
    )
}

fn render_service(
    plan: &mut RenderPlan,
    service: &Service,
    env: Vec<EnvVar>,
    overrides: &TagOverrides,
    options: &RenderingOptions,
) {
    let image = overrides.get(&service.name).map_or_else(
        || service.image.reference(),
        |tag| service.image.reference_with_tag(tag),
    );
    plan.insert(RenderedObject::Workload(Workload {
        name: service.name.clone(),
        image,
        port: service.port,
        env,
    }));
    plan.insert(RenderedObject::NetworkService(NetworkService {
        name: service.name.clone(),
        port: service.port,
        visibility: options.service_visibility,
    }));
    match &service.expose_path {
        Some(path) => plan.insert(RenderedObject::Route(Route {
            name: service.name.clone(),
            path: path.clone(),
            backend: service.name.clone(),
            port: service.port,
        })),
        None => {
            let _ = plan
                .removals
                .insert(ObjectKey::new(ObjectKind::Route, &service.name));
        }
    }
}

fn warn_unmatched(system: &System, resources: &ApplicationResources) {
    let app = &system.application;
    for record in &resources.shared_resources {
        if !app.requirements.contains_key(&record.resource_name) {
            tracing::warn!(resource = %record.resource_name, "external resource matches no shared requirement");
        }
    }
    for (service, service_records) in &resources.service_resources {
        for record in service_records {
            let matched = app
                .services
                .get(service)
                .is_some_and(|s| s.requirements.contains_key(&record.resource_name));
            if !matched {
                tracing::warn!(%service, resource = %record.resource_name, "external resource matches no private requirement");
            }
        }
    }
}
