//! docker-compose synthesis for monux workspaces.
//!
//! Each [`DeploymentTarget`](monux_core::DeploymentTarget) has its own
//! compose file. This crate parses them into a [`ComposeDefinition`], adds
//! services, volumes and networks, writes them back in a stable layout, and
//! computes the traefik labels that route public services.

#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod model;
pub mod traefik;
pub mod yaml;

pub use engine::{ComposeEngine, ServiceOptions, parse_compose};
pub use error::{Error, Result};
pub use model::{
    ComposeDefinition, ComposeService, EnvironmentEntry, PortMapping, VolumeMount,
    database_services,
};
pub use traefik::{check_sub_domain, get_traefik_labels};
