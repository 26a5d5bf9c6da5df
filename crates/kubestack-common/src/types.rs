//! Domain primitive types used across the kubestack workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KubestackError;

/// How a network service is reachable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    /// Reachable only from inside the cluster.
    #[default]
    ClusterLocal,
    /// Reachable through a port on every cluster node.
    NodeExposed,
}

impl Visibility {
    /// Returns the Kubernetes `Service.spec.type` for this visibility.
    #[must_use]
    pub const fn service_type(self) -> &'static str {
        match self {
            Self::ClusterLocal => "ClusterIP",
            Self::NodeExposed => "NodePort",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClusterLocal => write!(f, "cluster-local"),
            Self::NodeExposed => write!(f, "node-exposed"),
        }
    }
}

impl FromStr for Visibility {
    type Err = KubestackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cluster-local" | "ClusterIP" => Ok(Self::ClusterLocal),
            "node-exposed" | "NodePort" => Ok(Self::NodeExposed),
            other => Err(KubestackError::Config {
                message: format!(
                    "unknown service visibility \"{other}\" (expected cluster-local or node-exposed)"
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_maps_to_service_type() {
        assert_eq!(Visibility::ClusterLocal.service_type(), "ClusterIP");
        assert_eq!(Visibility::NodeExposed.service_type(), "NodePort");
    }

    #[test]
    fn visibility_parses_both_spellings() {
        assert_eq!("node-exposed".parse::<Visibility>().unwrap(), Visibility::NodeExposed);
        assert_eq!("ClusterIP".parse::<Visibility>().unwrap(), Visibility::ClusterLocal);
        assert!("public".parse::<Visibility>().is_err());
    }

    #[test]
    fn visibility_display_roundtrips_through_from_str() {
        for v in [Visibility::ClusterLocal, Visibility::NodeExposed] {
            assert_eq!(v.to_string().parse::<Visibility>().unwrap(), v);
        }
    }
}
