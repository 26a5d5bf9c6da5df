//! `kstk render` — Print the cluster objects an Envfile renders to.

use clap::Args;

use crate::commands::shared::{self, ClusterArgs, PlanArgs};
use crate::output;

/// Arguments for the `render` command.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Render inputs.
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Print a summary instead of manifests.
    #[arg(long)]
    pub summary: bool,
}

/// Executes the `render` command.
///
/// Prints a multi-document YAML stream in apply order. Nothing is sent to
/// the cluster.
///
/// # Errors
///
/// Returns an error if the Envfile is invalid or provisioning state cannot
/// be read.
pub fn execute(args: &RenderArgs) -> anyhow::Result<()> {
    let system = shared::load_system(&args.plan.file)?;
    let config = shared::resolve_config(&system, &args.plan, &ClusterArgs::default())?;
    let resources = shared::load_resources(&config, args.plan.app.as_deref())?;
    let plan = kubestack_render::render(
        &system,
        &resources,
        &args.plan.overrides(),
        &shared::rendering_options(&config),
    );

    if args.summary {
        print!("{}", output::plan_summary(&plan));
    } else {
        print!("{}", plan.to_yaml()?);
    }
    Ok(())
}
