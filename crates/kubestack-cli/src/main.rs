//! # kstk — kubestack CLI
//!
//! Validates Envfiles, renders them into cluster objects, extracts
//! provisioning state, and deploys the result with `kubectl`.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

mod commands;
mod output;

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;
    commands::execute(cli)
}

/// Sends logs to stderr, or appends them to `--logfile` when given.
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let default_level = if cli.logfile.is_some() { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &cli.logfile {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            let builder = builder.with_ansi(false).with_writer(Mutex::new(file));
            if cli.log_json {
                builder.json().init();
            } else {
                builder.init();
            }
        }
        None => {
            let builder = builder.with_writer(std::io::stderr);
            if cli.log_json {
                builder.json().init();
            } else {
                builder.init();
            }
        }
    }
    Ok(())
}
