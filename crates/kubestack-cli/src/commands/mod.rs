//! CLI command definitions and dispatch.

pub mod deploy;
pub mod extract;
pub mod render;
pub mod shared;
pub mod validate;
pub mod wipe;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// kubestack — render and deploy Envfile applications to a cluster.
#[derive(Parser, Debug)]
#[command(name = "kstk", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Append logs to this file instead of stderr.
    #[arg(long, global = true, env = "KSTK_LOGFILE")]
    pub logfile: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check an Envfile and report every problem found.
    Validate(validate::ValidateArgs),
    /// Print the cluster objects an Envfile renders to.
    Render(render::RenderArgs),
    /// Summarize the external resources found in provisioning state.
    Extract(extract::ExtractArgs),
    /// Render an Envfile and apply it to the cluster.
    Deploy(deploy::DeployArgs),
    /// Delete every object kind kubestack manages from the cluster.
    Wipe(wipe::WipeArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Validate(args) => validate::execute(&args),
        Command::Render(args) => render::execute(&args),
        Command::Extract(args) => extract::execute(&args),
        Command::Deploy(args) => deploy::execute(&args),
        Command::Wipe(args) => wipe::execute(&args),
    }
}
