//! # kubestack-render
//!
//! Turns a validated [`System`](kubestack_envfile::System) into cluster
//! objects.
//!
//! Handles:
//! - **Identity**: collision-free names for shared and private resources.
//! - **External**: provisioned resources that replace in-cluster instances.
//! - **Objects**: workloads, network services, routes, config records.
//! - **Renderer**: the pure render pass and its plan.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod external;
pub mod identity;
pub mod objects;
pub mod renderer;

pub use crate::external::{ApplicationResources, ExternalRecord};
pub use crate::identity::{ResourceIdentity, ResourceIndex};
pub use crate::objects::{ObjectKey, ObjectKind, RenderedObject};
pub use crate::renderer::{RenderPlan, RenderingOptions, TagOverrides, render};
