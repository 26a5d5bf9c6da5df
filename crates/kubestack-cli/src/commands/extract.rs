//! `kstk extract` — Summarize the external resources in provisioning state.

use clap::Args;
use kubestack_common::constants::DEFAULT_METADATA_TAG;

use crate::commands::shared;
use crate::output;

/// Arguments for the `extract` command.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Provisioning state locator, e.g. `terraform:file:///srv/terraform.tfstate`.
    pub locator: String,

    /// Tag holding resource ownership metadata.
    #[arg(long, default_value = DEFAULT_METADATA_TAG)]
    pub metadata_tag: String,

    /// Print the extracted records as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `extract` command.
///
/// # Errors
///
/// Returns an error if the state cannot be fetched or is malformed.
pub fn execute(args: &ExtractArgs) -> anyhow::Result<()> {
    let extracted = shared::extract_from(&args.locator, &args.metadata_tag)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&extracted.applications)?);
    } else {
        print!("{}", output::extraction_summary(&extracted));
    }
    Ok(())
}
