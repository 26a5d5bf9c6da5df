//! Sequencing of a deploy: render, apply in order, delete removals.
//!
//! Apply stops at the first failure. Objects applied before the failure
//! stay applied; there is no rollback.

use kubestack_envfile::System;
use kubestack_render::{
    ApplicationResources, ObjectKey, ObjectKind, RenderPlan, RenderingOptions, TagOverrides,
    render,
};

use crate::cluster::ClusterClient;
use crate::error::Result;

/// What a deploy changed on the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployReport {
    /// Objects applied, in apply order.
    pub applied: Vec<ObjectKey>,
    /// Objects deleted because they are no longer desired.
    pub removed: Vec<ObjectKey>,
}

/// Drives a [`ClusterClient`] through deploys and wipes.
pub struct Deployer {
    client: Box<dyn ClusterClient>,
}

impl Deployer {
    /// Creates a deployer over `client`.
    #[must_use]
    pub fn new(client: Box<dyn ClusterClient>) -> Self {
        Self { client }
    }

    /// Renders `system` and applies the result.
    ///
    /// # Errors
    ///
    /// Returns the first collaborator failure; objects applied before it
    /// are left in place.
    pub fn deploy(
        &self,
        system: &System,
        resources: &ApplicationResources,
        overrides: &TagOverrides,
        options: &RenderingOptions,
    ) -> Result<DeployReport> {
        let plan = render(system, resources, overrides, options);
        self.apply_plan(&plan)
    }

    /// Applies every object of `plan` in apply order, then deletes its
    /// removals.
    ///
    /// # Errors
    ///
    /// Returns the first collaborator failure.
    pub fn apply_plan(&self, plan: &RenderPlan) -> Result<DeployReport> {
        tracing::info!(objects = plan.len(), removals = plan.removals().len(), "applying plan");
        let mut report = DeployReport::default();
        for object in plan.iter() {
            self.client.apply(object).inspect_err(|e| {
                tracing::error!(object = %object.key(), error = %e, "apply failed, aborting");
            })?;
            report.applied.push(object.key());
        }
        for key in plan.removals() {
            self.client.delete(key.kind, &key.name)?;
            report.removed.push(key.clone());
        }
        tracing::info!(
            applied = report.applied.len(),
            removed = report.removed.len(),
            "deploy complete"
        );
        Ok(report)
    }

    /// Deletes every object kind this tool manages, routes first.
    ///
    /// # Errors
    ///
    /// Returns the first collaborator failure.
    pub fn wipe(&self) -> Result<()> {
        for kind in ObjectKind::ALL.iter().rev() {
            self.client.delete_all(*kind)?;
        }
        tracing::info!("cluster wiped");
        Ok(())
    }
}
