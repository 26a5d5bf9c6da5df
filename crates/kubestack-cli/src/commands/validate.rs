//! `kstk validate` — Check an Envfile and report every problem found.

use std::path::PathBuf;

use clap::Args;
use kubestack_common::constants::DEFAULT_ENVFILE;

use crate::commands::shared;

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the Envfile.
    #[arg(default_value = DEFAULT_ENVFILE)]
    pub file: PathBuf,
}

/// Executes the `validate` command.
///
/// # Errors
///
/// Returns an error listing every structural or semantic violation.
pub fn execute(args: &ValidateArgs) -> anyhow::Result<()> {
    let system = shared::load_system(&args.file)?;
    println!(
        "{}: valid ({} service(s), {} shared requirement(s), {} template(s))",
        args.file.display(),
        system.application.services.len(),
        system.application.requirements.len(),
        system.environment.templates.len()
    );
    Ok(())
}
