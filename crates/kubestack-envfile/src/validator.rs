//! Semantic validation of the application model.
//!
//! Checks for name collisions and dangling template references that the
//! structural schema cannot express. Runs after schema acceptance and
//! reports every violation at once.

use std::collections::BTreeMap;

use kubestack_common::error::{ValidationError, Violation};

use crate::model::{Requirement, Service, System};

/// Keys the renderer adds to every in-cluster config record.
const INJECTED_KEYS: [&str; 2] = ["host", "port"];

/// Validates a model for semantic correctness.
///
/// # Checks performed
///
/// 1. No shared requirement has the same name as a service.
/// 2. No private requirement has the same name as a shared requirement.
/// 3. Every requirement references a template defined in the environment.
/// 4. No two config keys of a template, and no config key and the injected
///    `host`/`port`, map to the same environment variable suffix.
///
/// # Errors
///
/// Returns a [`ValidationError`] listing every failed check, in the order
/// above.
pub fn validate(system: &System) -> Result<(), ValidationError> {
    tracing::info!("validating application model");
    let mut violations = Vec::new();
    check_shared_requirement_names(system, &mut violations);
    check_private_requirement_names(system, &mut violations);
    check_template_references(system, &mut violations);
    check_config_keys(system, &mut violations);
    if !violations.is_empty() {
        tracing::debug!(count = violations.len(), "semantic validation failed");
    }
    ValidationError::check(violations)
}

fn check_shared_requirement_names(system: &System, violations: &mut Vec<Violation>) {
    let app = &system.application;
    for name in app.requirements.keys() {
        if app.services.contains_key(name) {
            violations.push(Violation::new(
                requirement_path(None, name),
                format!("shared requirement conflicts with service /application/services/{name}"),
            ));
        }
    }
}

fn check_private_requirement_names(system: &System, violations: &mut Vec<Violation>) {
    let app = &system.application;
    for service in app.services.values() {
        for name in service.requirements.keys() {
            if app.requirements.contains_key(name) {
                violations.push(Violation::new(
                    requirement_path(Some(service), name),
                    format!(
                        "private requirement conflicts with shared requirement {}",
                        requirement_path(None, name)
                    ),
                ));
            }
        }
    }
}

fn check_template_references(system: &System, violations: &mut Vec<Violation>) {
    let templates = &system.environment.templates;
    for (service, requirement) in system.all_requirements() {
        if !templates.contains_key(&requirement.template) {
            violations.push(dangling_template(service, requirement));
        }
    }
}

fn check_config_keys(system: &System, violations: &mut Vec<Violation>) {
    for template in system.environment.templates.values() {
        let mut claimed: BTreeMap<String, &str> = INJECTED_KEYS
            .iter()
            .map(|key| (key.to_uppercase(), *key))
            .collect();
        for key in template.config.keys() {
            match claimed.get(&key.to_uppercase()) {
                Some(owner) => violations.push(Violation::new(
                    format!("/local/templates/{}/config/{key}", template.name),
                    format!("config key '{key}' maps to the same variable as '{owner}'"),
                )),
                None => {
                    let _ = claimed.insert(key.to_uppercase(), key.as_str());
                }
            }
        }
    }
}

fn dangling_template(service: Option<&Service>, requirement: &Requirement) -> Violation {
    Violation::new(
        format!("{}/template", requirement_path(service, &requirement.name)),
        format!(
            "template '{}' is not defined in /local/templates",
            requirement.template
        ),
    )
}

fn requirement_path(service: Option<&Service>, name: &str) -> String {
    service.map_or_else(
        || format!("/application/requires/{name}"),
        |s| format!("/application/services/{}/requires/{name}", s.name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Application, Environment, ImageRef, ResourceTemplate};

    fn make_service(name: &str) -> Service {
        Service::new(name, ImageRef::new(format!("example/{name}"), "1.0"))
    }

    fn base_system() -> System {
        System::default().with_environment(
            Environment::default()
                .with_template(ResourceTemplate::new("postgres", "postgres:9.6", 5432))
                .with_template(ResourceTemplate::new("redis", "redis:3", 6379)),
        )
    }

    #[test]
    fn validate_empty_system_succeeds() {
        assert!(validate(&System::default()).is_ok());
    }

    #[test]
    fn validate_valid_system_succeeds() {
        let system = base_system().with_application(
            Application::default()
                .with_requirement(Requirement::new("cache", "redis"))
                .with_service(
                    make_service("web").with_requirement(Requirement::new("db", "postgres")),
                )
                .with_service(
                    make_service("worker").with_requirement(Requirement::new("db", "postgres")),
                ),
        );
        assert!(validate(&system).is_ok());
    }

    #[test]
    fn shared_requirement_named_like_service_fails() {
        let system = base_system().with_application(
            Application::default()
                .with_requirement(Requirement::new("web", "postgres"))
                .with_service(make_service("web")),
        );
        let err = validate(&system).unwrap_err();
        assert_eq!(err.len(), 1);
        let violation = &err.violations()[0];
        assert_eq!(violation.path, "/application/requires/web");
        assert!(
            violation.message.contains("/application/services/web"),
            "got: {violation}"
        );
    }

    #[test]
    fn private_requirement_shadowing_shared_fails() {
        let system = base_system().with_application(
            Application::default()
                .with_requirement(Requirement::new("db", "postgres"))
                .with_service(
                    make_service("web").with_requirement(Requirement::new("db", "postgres")),
                ),
        );
        let err = validate(&system).unwrap_err();
        assert_eq!(err.len(), 1);
        let violation = &err.violations()[0];
        assert_eq!(violation.path, "/application/services/web/requires/db");
        assert!(violation.message.contains("/application/requires/db"), "got: {violation}");
    }

    #[test]
    fn dangling_template_names_path_and_template() {
        let system = base_system().with_application(
            Application::default().with_service(
                make_service("web").with_requirement(Requirement::new("db", "mysql")),
            ),
        );
        let err = validate(&system).unwrap_err();
        let violation = &err.violations()[0];
        assert_eq!(violation.path, "/application/services/web/requires/db/template");
        assert!(violation.message.contains("'mysql'"), "got: {violation}");
    }

    #[test]
    fn config_keys_colliding_after_upper_casing_fail() {
        let system = System::default().with_environment(
            Environment::default().with_template(
                ResourceTemplate::new("postgres", "postgres:9.6", 5432)
                    .with_config("HOST", "overridden")
                    .with_config("user", "app")
                    .with_config("USER", "admin"),
            ),
        );
        let err = validate(&system).unwrap_err();
        let paths: Vec<&str> = err.violations().iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/local/templates/postgres/config/HOST",
                "/local/templates/postgres/config/user",
            ]
        );
        assert!(err.violations()[0].message.contains("'host'"), "got: {err}");
    }

    #[test]
    fn distinct_config_keys_pass() {
        let system = System::default().with_environment(
            Environment::default().with_template(
                ResourceTemplate::new("postgres", "postgres:9.6", 5432)
                    .with_config("user", "app")
                    .with_config("database", "main"),
            ),
        );
        assert!(validate(&system).is_ok());
    }

    #[test]
    fn all_violations_reported_in_check_order() {
        let system = base_system().with_application(
            Application::default()
                .with_requirement(Requirement::new("web", "missing-a"))
                .with_requirement(Requirement::new("db", "postgres"))
                .with_service(
                    make_service("web").with_requirement(Requirement::new("db", "missing-b")),
                ),
        );
        let err = validate(&system).unwrap_err();
        let paths: Vec<&str> = err.violations().iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/application/requires/web",
                "/application/services/web/requires/db",
                "/application/requires/web/template",
                "/application/services/web/requires/db/template",
            ]
        );
    }
}
