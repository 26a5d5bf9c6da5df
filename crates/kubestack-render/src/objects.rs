//! Rendered orchestration objects and their manifest form.
//!
//! Each object is identified by an [`ObjectKey`] (kind + name). Keys order
//! by kind first, in apply order, so a sorted collection of objects is
//! already in the order they must be applied.

use std::collections::BTreeMap;
use std::fmt;

use kubestack_common::constants::NAME_LABEL;
use kubestack_common::types::Visibility;
use serde_json::{Value, json};

/// Kind of a rendered object, ordered for application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKind {
    /// Key/value configuration consumed by workloads (`ConfigMap`).
    ConfigRecord,
    /// A deployable workload (`Deployment`).
    Workload,
    /// A network endpoint in front of a workload (`Service`).
    NetworkService,
    /// An HTTP path route to a network service (`Ingress`).
    Route,
}

impl ObjectKind {
    /// All kinds in apply order.
    pub const ALL: [Self; 4] = [
        Self::ConfigRecord,
        Self::Workload,
        Self::NetworkService,
        Self::Route,
    ];

    /// Returns the orchestration-system kind name.
    #[must_use]
    pub const fn kind_name(self) -> &'static str {
        match self {
            Self::ConfigRecord => "ConfigMap",
            Self::Workload => "Deployment",
            Self::NetworkService => "Service",
            Self::Route => "Ingress",
        }
    }

    /// Returns the API group/version of the kind.
    #[must_use]
    pub const fn api_version(self) -> &'static str {
        match self {
            Self::ConfigRecord | Self::NetworkService => "v1",
            Self::Workload => "apps/v1",
            Self::Route => "networking.k8s.io/v1",
        }
    }

    /// Returns the resource name used on the cluster CLI.
    #[must_use]
    pub const fn cli_name(self) -> &'static str {
        match self {
            Self::ConfigRecord => "configmap",
            Self::Workload => "deployment",
            Self::NetworkService => "service",
            Self::Route => "ingress",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())
    }
}

/// Stable identity of a rendered object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    /// Object kind.
    pub kind: ObjectKind,
    /// Object name.
    pub name: String,
}

impl ObjectKey {
    /// Creates a key.
    #[must_use]
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.cli_name(), self.name)
    }
}

/// An environment variable sourced from a key of a config record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    /// Variable name, e.g. `DB_RESOURCE_HOST`.
    pub name: String,
    /// Name of the config record holding the value.
    pub config_record: String,
    /// Key within the config record.
    pub key: String,
}

/// A deployable workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    /// Workload name, also its `name` label.
    pub name: String,
    /// Full image reference.
    pub image: String,
    /// Container port.
    pub port: u16,
    /// Injected environment, in deterministic order.
    pub env: Vec<EnvVar>,
}

/// A network endpoint selecting a workload by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkService {
    /// Service name, equal to the workload name.
    pub name: String,
    /// Exposed and target port.
    pub port: u16,
    /// Reachability from outside the cluster.
    pub visibility: Visibility,
}

/// An HTTP path prefix routed to a network service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Route name, equal to the backend name.
    pub name: String,
    /// Path prefix.
    pub path: String,
    /// Backend network service name.
    pub backend: String,
    /// Backend port.
    pub port: u16,
}

/// Where a config record's data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Derived from an in-cluster backing instance.
    Internal,
    /// Taken from provisioning state.
    External,
}

/// Key/value configuration for one requirement instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRecord {
    /// Record name, the instance identity.
    pub name: String,
    /// Requirement name as declared, used for variable names.
    pub resource_name: String,
    /// Origin of the data.
    pub source: ConfigSource,
    /// Record contents.
    pub data: BTreeMap<String, String>,
}

/// One object produced by a render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedObject {
    /// See [`Workload`].
    Workload(Workload),
    /// See [`NetworkService`].
    NetworkService(NetworkService),
    /// See [`Route`].
    Route(Route),
    /// See [`ConfigRecord`].
    ConfigRecord(ConfigRecord),
}

impl RenderedObject {
    /// Returns the object's kind.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Workload(_) => ObjectKind::Workload,
            Self::NetworkService(_) => ObjectKind::NetworkService,
            Self::Route(_) => ObjectKind::Route,
            Self::ConfigRecord(_) => ObjectKind::ConfigRecord,
        }
    }

    /// Returns the object's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Workload(w) => &w.name,
            Self::NetworkService(s) => &s.name,
            Self::Route(r) => &r.name,
            Self::ConfigRecord(c) => &c.name,
        }
    }

    /// Returns the object's stable key.
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.kind(), self.name())
    }

    /// Converts the object to its orchestration-system manifest.
    #[must_use]
    pub fn to_manifest(&self) -> Value {
        let kind = self.kind();
        let (metadata, body) = match self {
            Self::Workload(w) => (labelled_metadata(&w.name), workload_body(w)),
            Self::NetworkService(s) => (labelled_metadata(&s.name), service_body(s)),
            Self::Route(r) => (json!({"name": r.name}), route_body(r)),
            Self::ConfigRecord(c) => (json!({"name": c.name}), json!({"data": c.data})),
        };
        let mut manifest = json!({
            "apiVersion": kind.api_version(),
            "kind": kind.kind_name(),
            "metadata": metadata,
        });
        if let (Some(target), Value::Object(fields)) = (manifest.as_object_mut(), body) {
            target.extend(fields);
        }
        manifest
    }
}

fn labelled_metadata(name: &str) -> Value {
    json!({"name": name, "labels": {NAME_LABEL: name}})
}

fn workload_body(workload: &Workload) -> Value {
    let env: Vec<Value> = workload
        .env
        .iter()
        .map(|var| {
            json!({
                "name": var.name,
                "valueFrom": {"configMapKeyRef": {"name": var.config_record, "key": var.key}},
            })
        })
        .collect();
    json!({
        "spec": {
            "replicas": 1,
            "selector": {"matchLabels": {NAME_LABEL: workload.name}},
            "template": {
                "metadata": {"labels": {NAME_LABEL: workload.name}},
                "spec": {
                    "containers": [{
                        "name": workload.name,
                        "image": workload.image,
                        "imagePullPolicy": "IfNotPresent",
                        "ports": [{"containerPort": workload.port}],
                        "env": env,
                    }],
                },
            },
        },
    })
}

fn service_body(service: &NetworkService) -> Value {
    json!({
        "spec": {
            "type": service.visibility.service_type(),
            "ports": [{"port": service.port, "targetPort": service.port, "protocol": "TCP"}],
            "selector": {NAME_LABEL: service.name},
        },
    })
}

fn route_body(route: &Route) -> Value {
    json!({
        "spec": {
            "rules": [{
                "http": {
                    "paths": [{
                        "path": route.path,
                        "pathType": "Prefix",
                        "backend": {
                            "service": {"name": route.backend, "port": {"number": route.port}},
                        },
                    }],
                },
            }],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_sort_in_apply_order() {
        let mut kinds = vec![
            ObjectKind::Route,
            ObjectKind::NetworkService,
            ObjectKind::ConfigRecord,
            ObjectKind::Workload,
        ];
        kinds.sort();
        assert_eq!(kinds, ObjectKind::ALL.to_vec());
    }

    #[test]
    fn key_display_uses_cli_name() {
        let key = ObjectKey::new(ObjectKind::Route, "web");
        assert_eq!(key.to_string(), "ingress/web");
    }

    #[test]
    fn workload_manifest_references_config_records() {
        let object = RenderedObject::Workload(Workload {
            name: "web".into(),
            image: "example/web:1.0".into(),
            port: 5100,
            env: vec![EnvVar {
                name: "DB_RESOURCE_HOST".into(),
                config_record: "web---db".into(),
                key: "host".into(),
            }],
        });
        let manifest = object.to_manifest();
        assert_eq!(manifest["apiVersion"], "apps/v1");
        assert_eq!(manifest["kind"], "Deployment");
        assert_eq!(manifest["metadata"]["labels"]["name"], "web");
        assert_eq!(manifest["spec"]["selector"]["matchLabels"]["name"], "web");
        let container = &manifest["spec"]["template"]["spec"]["containers"][0];
        assert_eq!(container["image"], "example/web:1.0");
        assert_eq!(container["ports"][0]["containerPort"], 5100);
        assert_eq!(
            container["env"][0]["valueFrom"]["configMapKeyRef"],
            json!({"name": "web---db", "key": "host"})
        );
    }

    #[test]
    fn service_manifest_reflects_visibility() {
        let object = RenderedObject::NetworkService(NetworkService {
            name: "web".into(),
            port: 80,
            visibility: Visibility::NodeExposed,
        });
        let manifest = object.to_manifest();
        assert_eq!(manifest["spec"]["type"], "NodePort");
        assert_eq!(manifest["spec"]["selector"]["name"], "web");
    }

    #[test]
    fn route_manifest_uses_prefix_path() {
        let object = RenderedObject::Route(Route {
            name: "web".into(),
            path: "/hello".into(),
            backend: "web".into(),
            port: 5100,
        });
        let manifest = object.to_manifest();
        let path = &manifest["spec"]["rules"][0]["http"]["paths"][0];
        assert_eq!(path["path"], "/hello");
        assert_eq!(path["pathType"], "Prefix");
        assert_eq!(path["backend"]["service"]["port"]["number"], 5100);
    }

    #[test]
    fn config_record_manifest_carries_data() {
        let object = RenderedObject::ConfigRecord(ConfigRecord {
            name: "cache".into(),
            resource_name: "cache".into(),
            source: ConfigSource::Internal,
            data: BTreeMap::from([("host".to_owned(), "cache".to_owned())]),
        });
        let manifest = object.to_manifest();
        assert_eq!(manifest["kind"], "ConfigMap");
        assert_eq!(manifest["data"]["host"], "cache");
        assert_eq!(object.key(), ObjectKey::new(ObjectKind::ConfigRecord, "cache"));
    }
}
