//! Deployment edition and topology

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which product edition this deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edition {
    /// Self-hosted, single role per project, no billing.
    #[default]
    Community,
    /// Self-hosted, multi-role projects, no billing.
    Enterprise,
    /// Hosted multi-tenant service with billing.
    Cloud,
}

impl Edition {
    pub fn supports_multi_role(&self) -> bool {
        !matches!(self, Self::Community)
    }

    pub fn has_billing(&self) -> bool {
        matches!(self, Self::Cloud)
    }

    /// Non-cloud deployments fall back to their default platform when a
    /// request cannot be attributed to a tenant.
    pub fn is_single_tenant(&self) -> bool {
        !matches!(self, Self::Cloud)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::Enterprise => "enterprise",
            Self::Cloud => "cloud",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Edition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "community" | "ce" => Ok(Self::Community),
            "enterprise" | "ee" => Ok(Self::Enterprise),
            "cloud" => Ok(Self::Cloud),
            other => Err(format!("unknown edition '{}'", other)),
        }
    }
}

/// Process topology. Multi-node deployments cannot share a generated
/// signing secret and must configure one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    #[default]
    SingleNode,
    MultiNode,
}

impl FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single_node" | "single-node" | "memory" => Ok(Self::SingleNode),
            "multi_node" | "multi-node" => Ok(Self::MultiNode),
            other => Err(format!("unknown deployment mode '{}'", other)),
        }
    }
}
