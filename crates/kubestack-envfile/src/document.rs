//! Typed decoding of a schema-valid Envfile into the application model.

use std::collections::BTreeMap;

use kubestack_common::constants::DEFAULT_SERVICE_PORT;
use kubestack_common::error::{ValidationError, Violation};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::model::{
    Application, Environment, ImageRef, Requirement, ResourceTemplate, Service, System,
};

#[derive(Debug, Deserialize)]
struct EnvfileDocument {
    local: LocalDecl,
    #[serde(default)]
    remote: Map<String, Value>,
    application: ApplicationDecl,
}

#[derive(Debug, Deserialize)]
struct LocalDecl {
    templates: BTreeMap<String, TemplateDecl>,
}

#[derive(Debug, Deserialize)]
struct TemplateDecl {
    image: String,
    config: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ApplicationDecl {
    #[serde(default)]
    requires: BTreeMap<String, RequirementDecl>,
    services: BTreeMap<String, ServiceDecl>,
}

#[derive(Debug, Deserialize)]
struct RequirementDecl {
    template: String,
}

#[derive(Debug, Deserialize)]
struct ServiceDecl {
    image: ImageDecl,
    port: Option<u16>,
    expose: Option<ExposeDecl>,
    #[serde(default)]
    requires: BTreeMap<String, RequirementDecl>,
}

#[derive(Debug, Deserialize)]
struct ImageDecl {
    repository: String,
    tag: String,
}

#[derive(Debug, Deserialize)]
struct ExposeDecl {
    path: String,
}

/// Builds the model from a document that already passed the schema.
///
/// # Errors
///
/// Returns a [`ValidationError`] if the document does not decode into the
/// typed form, which only happens when it bypassed the schema.
pub(crate) fn decode(document: &Value) -> Result<System, ValidationError> {
    let decoded = EnvfileDocument::deserialize(document)
        .map_err(|e| single_violation("/", format!("cannot decode document: {e}")))?;

    let mut environment = Environment::default();
    for (name, decl) in decoded.local.templates {
        environment = environment.with_template(decode_template(name, decl)?);
    }

    let mut application = Application::default();
    for (name, decl) in decoded.application.requires {
        application = application.with_requirement(Requirement::new(name, decl.template));
    }
    for (name, decl) in decoded.application.services {
        let mut service = Service::new(name, ImageRef::new(decl.image.repository, decl.image.tag))
            .with_port(decl.port.unwrap_or(DEFAULT_SERVICE_PORT));
        if let Some(expose) = decl.expose {
            service = service.with_expose_path(expose.path);
        }
        for (req_name, req) in decl.requires {
            service = service.with_requirement(Requirement::new(req_name, req.template));
        }
        application = application.with_service(service);
    }

    Ok(System::default()
        .with_environment(environment)
        .with_application(application)
        .with_remote_config(decoded.remote))
}

fn decode_template(name: String, decl: TemplateDecl) -> Result<ResourceTemplate, ValidationError> {
    let port_path = format!("/local/templates/{name}/config/port");
    let port = decl
        .config
        .get("port")
        .and_then(Value::as_u64)
        .and_then(|p| u16::try_from(p).ok())
        .ok_or_else(|| single_violation(&port_path, "port must be an integer in 1..=65535"))?;

    let mut template = ResourceTemplate::new(name, decl.image, port);
    for (key, value) in decl.config {
        if key == "port" {
            continue;
        }
        let value = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(single_violation(
                    &format!("/local/templates/{}/config/{key}", template.name),
                    format!("{other} is not a scalar value"),
                ));
            }
        };
        template = template.with_config(key, value);
    }
    Ok(template)
}

fn single_violation(path: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::single(Violation::new(path, message))
}
