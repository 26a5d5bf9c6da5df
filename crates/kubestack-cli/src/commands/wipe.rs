//! `kstk wipe` — Delete every object kind kubestack manages.

use std::path::PathBuf;

use clap::Args;
use kubestack_common::config::KubestackConfig;
use kubestack_deploy::Deployer;

use crate::commands::shared::{self, ClusterArgs};

/// Arguments for the `wipe` command.
#[derive(Args, Debug)]
pub struct WipeArgs {
    /// Cluster selection.
    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// Envfile whose `remote` section selects the cluster context.
    #[arg(long)]
    pub envfile: Option<PathBuf>,

    /// Confirm deleting every ingress, service, deployment and configmap.
    #[arg(long)]
    pub yes: bool,
}

/// Executes the `wipe` command.
///
/// # Errors
///
/// Returns an error if `--yes` is missing or a deletion fails.
pub fn execute(args: &WipeArgs) -> anyhow::Result<()> {
    if !args.yes {
        anyhow::bail!("wipe deletes every managed object in the context; pass --yes to confirm");
    }
    let mut config = match &args.envfile {
        Some(path) => KubestackConfig::default().with_remote(&shared::load_system(path)?.remote_config)?,
        None => KubestackConfig::default(),
    };
    if let Some(kubectl) = &args.cluster.kubectl {
        config.kubectl.clone_from(kubectl);
    }
    if args.cluster.context.is_some() {
        config.context.clone_from(&args.cluster.context);
    }

    Deployer::new(Box::new(shared::kubectl(&config)?)).wipe()?;
    println!("Wiped context {}.", config.context.as_deref().unwrap_or("(current)"));
    Ok(())
}
