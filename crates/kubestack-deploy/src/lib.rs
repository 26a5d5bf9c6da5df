//! # kubestack-deploy
//!
//! Thin deployment driver around the pure render pass.
//!
//! Provides:
//! - **Cluster**: the [`ClusterClient`] seam and its `kubectl` implementation.
//! - **Fetch**: provisioning state locators and fetchers.
//! - **Orchestrator**: apply sequencing and wipes.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod cluster;
pub mod error;
pub mod fetch;
pub mod orchestrator;

pub use crate::cluster::{AddressResolver, ClusterClient, Kubectl};
pub use crate::error::{DeployError, Result};
pub use crate::fetch::{DefaultStateFetcher, StateFetcher, StateLocator};
pub use crate::orchestrator::{DeployReport, Deployer};
