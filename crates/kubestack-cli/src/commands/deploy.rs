//! `kstk deploy` — Render an Envfile and apply it to the cluster.

use clap::Args;
use kubestack_common::types::Visibility;
use kubestack_deploy::{AddressResolver, Deployer};
use kubestack_envfile::System;

use crate::commands::shared::{self, ClusterArgs, PlanArgs};

/// Arguments for the `deploy` command.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Render inputs.
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Cluster selection.
    #[command(flatten)]
    pub cluster: ClusterArgs,
}

/// Executes the `deploy` command.
///
/// Objects are applied in order and the run stops at the first failure;
/// objects applied before it are not rolled back.
///
/// # Errors
///
/// Returns an error if loading, rendering, or any cluster call fails.
pub fn execute(args: &DeployArgs) -> anyhow::Result<()> {
    let system = shared::load_system(&args.plan.file)?;
    let config = shared::resolve_config(&system, &args.plan, &args.cluster)?;
    let kubectl = shared::kubectl(&config)?;
    let resources = shared::load_resources(&config, args.plan.app.as_deref())?;

    tracing::info!(file = %args.plan.file.display(), context = ?config.context, "deploying");
    let report = Deployer::new(Box::new(kubectl.clone())).deploy(
        &system,
        &resources,
        &args.plan.overrides(),
        &shared::rendering_options(&config),
    )?;

    println!(
        "Applied {} object(s), removed {}.",
        report.applied.len(),
        report.removed.len()
    );
    if config.service_visibility == Visibility::NodeExposed {
        print_urls(&system, &kubectl);
    }
    Ok(())
}

/// Prints the URL of every exposed service; lookup failures are logged.
fn print_urls(system: &System, resolver: &dyn AddressResolver) {
    for service in system.application.services.values() {
        let Some(path) = &service.expose_path else {
            continue;
        };
        match resolver.service_url(&service.name) {
            Ok(Some(url)) => println!("  {}: {url}{path}", service.name),
            Ok(None) => tracing::debug!(service = %service.name, "service has no external address"),
            Err(e) => tracing::warn!(service = %service.name, error = %e, "cannot resolve service address"),
        }
    }
}
