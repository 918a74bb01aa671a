//! Deployment targets.
//!
//! Every generated environment file, compose file and traefik label set is
//! parameterized by one of four targets. Each target owns exactly one
//! docker-compose file.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The environment a workspace is deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentTarget {
    /// Local development with exposed ports and no reverse proxy.
    Dev,
    /// Local docker deployment routed through traefik on `localhost`.
    Local,
    /// Staging deployment.
    Stage,
    /// Production deployment.
    Prod,
}

impl DeploymentTarget {
    /// All targets in declaration order.
    pub const ALL: [Self; 4] = [Self::Dev, Self::Local, Self::Stage, Self::Prod];

    /// Short name used in generated TypeScript (`case 'dev':`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Local => "local",
            Self::Stage => "stage",
            Self::Prod => "prod",
        }
    }

    /// The docker-compose file backing this target.
    #[must_use]
    pub const fn compose_file_name(self) -> &'static str {
        match self {
            Self::Dev => "dev.docker-compose.yaml",
            Self::Local => "local.docker-compose.yaml",
            Self::Stage => "stage.docker-compose.yaml",
            Self::Prod => "docker-compose.yaml",
        }
    }

    /// Resolve a target from its compose file name.
    #[must_use]
    pub fn from_compose_file_name(file_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|target| target.compose_file_name() == file_name)
    }

    /// Whether routers for this target terminate TLS.
    #[must_use]
    pub const fn uses_tls(self) -> bool {
        matches!(self, Self::Stage | Self::Prod)
    }
}

impl fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DeploymentTarget {
    type Err = Error;

    /// Accepts either the short name or the compose file name, so
    /// `"dev"` and `"dev.docker-compose.yaml"` are equivalent.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let by_name = match trimmed.to_lowercase().as_str() {
            "dev" => Some(Self::Dev),
            "local" => Some(Self::Local),
            "stage" => Some(Self::Stage),
            "prod" => Some(Self::Prod),
            _ => None,
        };
        by_name
            .or_else(|| Self::from_compose_file_name(trimmed))
            .ok_or_else(|| Error::InvalidTarget {
                value: s.to_string(),
            })
    }
}
