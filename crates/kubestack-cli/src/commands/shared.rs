//! Arguments and helpers shared by several commands.
//!
//! Settings are layered: built-in defaults, then the `remote` section of
//! the Envfile, then the flags below.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use kubestack_common::config::KubestackConfig;
use kubestack_common::constants::DEFAULT_ENVFILE;
use kubestack_common::types::Visibility;
use kubestack_deploy::{DefaultStateFetcher, Kubectl, StateFetcher, StateLocator};
use kubestack_envfile::System;
use kubestack_render::{ApplicationResources, RenderingOptions, TagOverrides};
use kubestack_tfstate::{ExtractedState, ExtractorConfig};

/// Cluster CLI selection.
#[derive(Args, Debug, Clone, Default)]
pub struct ClusterArgs {
    /// Cluster CLI binary name or path.
    #[arg(long, env = "KSTK_KUBECTL")]
    pub kubectl: Option<String>,

    /// Cluster context to target.
    #[arg(long, env = "KSTK_CONTEXT")]
    pub context: Option<String>,
}

/// Inputs of a render pass.
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Path to the Envfile.
    #[arg(default_value = DEFAULT_ENVFILE)]
    pub file: PathBuf,

    /// Override a service's image tag, as `service=tag`. Repeatable.
    #[arg(long = "tag", value_parser = parse_tag_override)]
    pub tags: Vec<(String, String)>,

    /// Reachability of service endpoints: `cluster-local` or `node-exposed`.
    #[arg(long)]
    pub visibility: Option<Visibility>,

    /// Provisioning state locator, e.g. `terraform:file:///srv/terraform.tfstate`.
    #[arg(long, env = "KSTK_STATE")]
    pub state: Option<String>,

    /// Application to take from the provisioning state.
    #[arg(long)]
    pub app: Option<String>,

    /// Tag holding resource ownership metadata.
    #[arg(long)]
    pub metadata_tag: Option<String>,
}

impl PlanArgs {
    /// Returns the tag overrides as a map.
    pub fn overrides(&self) -> TagOverrides {
        self.tags.iter().cloned().collect()
    }
}

/// Parses a `service=tag` override.
pub fn parse_tag_override(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((service, tag)) if !service.is_empty() && !tag.is_empty() => {
            Ok((service.to_owned(), tag.to_owned()))
        }
        _ => Err(format!("expected service=tag, got '{raw}'")),
    }
}

/// Loads and validates the Envfile at `path`.
pub fn load_system(path: &std::path::Path) -> anyhow::Result<System> {
    kubestack_envfile::load_system_from_path(path)
        .with_context(|| format!("cannot load {}", path.display()))
}

/// Layers the Envfile's `remote` section and the flags over the defaults.
pub fn resolve_config(
    system: &System,
    plan: &PlanArgs,
    cluster: &ClusterArgs,
) -> anyhow::Result<KubestackConfig> {
    let mut config = KubestackConfig::default()
        .with_remote(&system.remote_config)
        .context("invalid remote section")?;
    if let Some(kubectl) = &cluster.kubectl {
        config.kubectl.clone_from(kubectl);
    }
    if cluster.context.is_some() {
        config.context.clone_from(&cluster.context);
    }
    if plan.state.is_some() {
        config.state.clone_from(&plan.state);
    }
    if let Some(visibility) = plan.visibility {
        config.service_visibility = visibility;
    }
    if let Some(tag) = &plan.metadata_tag {
        config.metadata_tag.clone_from(tag);
    }
    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

/// Returns the rendering options selected by `config`.
pub const fn rendering_options(config: &KubestackConfig) -> RenderingOptions {
    RenderingOptions::new(config.service_visibility)
}

/// Fetches and extracts the provisioning state at `locator`.
pub fn extract_from(locator: &str, metadata_tag: &str) -> anyhow::Result<ExtractedState> {
    let locator: StateLocator = locator.parse()?;
    let raw = DefaultStateFetcher::default().fetch(&locator)?;
    let config = ExtractorConfig::default().with_metadata_tag(metadata_tag);
    Ok(kubestack_tfstate::extract_state_with(&raw, &config)?)
}

/// Returns the external resources for this run, empty without a state
/// locator.
pub fn load_resources(
    config: &KubestackConfig,
    app: Option<&str>,
) -> anyhow::Result<ApplicationResources> {
    let Some(locator) = &config.state else {
        return Ok(ApplicationResources::default());
    };
    let extracted = extract_from(locator, &config.metadata_tag)?;
    let (name, resources) = extracted.select(app)?;
    tracing::info!(app = name, records = resources.len(), "using provisioned resources");
    Ok(resources.clone())
}

/// Locates the cluster CLI selected by `config`.
pub fn kubectl(config: &KubestackConfig) -> anyhow::Result<Kubectl> {
    Ok(Kubectl::locate(&config.kubectl, config.context.clone())?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn plan_args() -> PlanArgs {
        PlanArgs {
            file: PathBuf::from(DEFAULT_ENVFILE),
            tags: Vec::new(),
            visibility: None,
            state: None,
            app: None,
            metadata_tag: None,
        }
    }

    #[test]
    fn parse_tag_override_splits_on_equals() {
        assert_eq!(
            parse_tag_override("web=dev-3").unwrap(),
            ("web".to_owned(), "dev-3".to_owned())
        );
        assert!(parse_tag_override("web").is_err());
        assert!(parse_tag_override("=dev").is_err());
    }

    #[test]
    fn flags_override_remote_section() {
        let system = System::default().with_remote_config(
            json!({"context": "staging", "visibility": "node-exposed"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let cluster = ClusterArgs {
            kubectl: None,
            context: Some("prod".into()),
        };
        let config = resolve_config(&system, &plan_args(), &cluster).unwrap();
        assert_eq!(config.context.as_deref(), Some("prod"));
        assert_eq!(config.service_visibility, Visibility::NodeExposed);
        assert_eq!(config.kubectl, "kubectl");
    }

    #[test]
    fn no_state_means_no_resources() {
        let resources = load_resources(&KubestackConfig::default(), None).unwrap();
        assert!(resources.is_empty());
    }
}
