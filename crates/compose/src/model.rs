//! Structural model of a docker-compose file.
//!
//! Parsing normalizes the shapes compose accepts for the same data: volume
//! strings are split on the first `:`, `environment` and `networks` may be
//! lists or maps, and ports are `"external:internal"` strings or bare
//! numbers. Keys monux does not model are kept verbatim in `extra` so a
//! parse and serialize cycle does not lose them.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Image name prefixes of database engines.
pub const DATABASE_ENGINES: &[&str] = &["postgres", "mysql", "mariadb", "mongo"];

/// A whole compose file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComposeDefinition {
    /// Services in file order.
    pub services: Vec<ComposeService>,
    /// Named volumes.
    pub volumes: Vec<String>,
    /// Named networks.
    pub networks: Vec<String>,
    /// Other top-level keys (`version`, `x-*`, `secrets`).
    #[serde(skip_serializing_if = "Mapping::is_empty")]
    pub extra: Mapping,
}

/// One service of a compose file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComposeService {
    /// Service name, unique within the file.
    pub name: String,
    /// Image to run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Build context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    /// Mounted volumes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeMount>,
    /// Networks the service joins.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
    /// Environment entries.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvironmentEntry>,
    /// Docker labels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Published ports.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortMapping>,
    /// Other service keys, in file order.
    #[serde(skip_serializing_if = "Mapping::is_empty")]
    pub extra: Mapping,
}

/// A volume entry: `path` alone, or `path:mount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeMount {
    /// Volume name or host path.
    pub path: String,
    /// Container path, with any `:ro` suffix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount: Option<String>,
}

/// An environment entry. A key without value is passed through from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentEntry {
    /// Variable name.
    pub key: String,
    /// Value, often a `${variable}` interpolation.
    pub value: Option<String>,
}

/// A port mapping. Without `external` the container port is published on a
/// random host port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortMapping {
    /// Host side, with an optional bind address.
    pub external: Option<String>,
    /// Container side.
    pub internal: String,
}

impl VolumeMount {
    /// A named volume mounted at `mount`.
    pub fn new(path: impl Into<String>, mount: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mount: Some(mount.into()),
        }
    }

    /// Parse the short syntax.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text.split_once(':') {
            Some((path, mount)) => Self::new(path, mount),
            None => Self {
                path: text.to_string(),
                mount: None,
            },
        }
    }

    /// Short syntax text.
    #[must_use]
    pub fn render(&self) -> String {
        match &self.mount {
            Some(mount) => format!("{}:{mount}", self.path),
            None => self.path.clone(),
        }
    }
}

impl EnvironmentEntry {
    /// An entry with a value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Parse a list entry (`KEY=value` or `KEY`).
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text.split_once('=') {
            Some((key, value)) => Self::new(key, value),
            None => Self {
                key: text.to_string(),
                value: None,
            },
        }
    }

    /// List entry text.
    #[must_use]
    pub fn render(&self) -> String {
        match &self.value {
            Some(value) => format!("{}={value}", self.key),
            None => self.key.clone(),
        }
    }
}

impl PortMapping {
    /// Publish container port `internal` on host port `external`.
    #[must_use]
    pub fn new(external: u16, internal: u16) -> Self {
        Self {
            external: Some(external.to_string()),
            internal: internal.to_string(),
        }
    }

    /// Parse the short syntax. The container side follows the last `:`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text.rsplit_once(':') {
            Some((external, internal)) => Self {
                external: Some(external.to_string()),
                internal: internal.to_string(),
            },
            None => Self {
                external: None,
                internal: text.to_string(),
            },
        }
    }

    /// Short syntax text.
    #[must_use]
    pub fn render(&self) -> String {
        match &self.external {
            Some(external) => format!("{external}:{}", self.internal),
            None => self.internal.clone(),
        }
    }
}

impl ComposeService {
    /// A service running `image`.
    pub fn with_image(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: Some(image.into()),
            ..Self::default()
        }
    }

    /// A service built from the context at `build`.
    pub fn with_build(name: impl Into<String>, build: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            build: Some(build.into()),
            ..Self::default()
        }
    }

    /// Whether the service runs a known database engine image.
    #[must_use]
    pub fn is_database(&self) -> bool {
        if self.build.is_some() {
            return false;
        }
        self.image.as_deref().is_some_and(|image| {
            let base = image.rsplit('/').next().unwrap_or(image);
            DATABASE_ENGINES
                .iter()
                .any(|engine| base.starts_with(engine))
        })
    }
}

impl ComposeDefinition {
    /// Parse compose YAML. `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns a YAML error for invalid syntax, a structural mismatch when
    /// the `services` key is missing, and [`Error::InvalidService`] for
    /// service shapes that cannot be normalized.
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        let root: Value = serde_yaml::from_str(content).map_err(|source| Error::Yaml {
            source,
            path: Some(path.to_path_buf()),
        })?;
        let Value::Mapping(root) = root else {
            return Err(Error::structural(path, "expected a mapping at the top level"));
        };

        let mut definition = Self::default();
        let mut has_services = false;
        for (key, value) in root {
            match key.as_str() {
                Some("services") => {
                    has_services = true;
                    definition.services = parse_services(value, path)?;
                }
                Some("volumes") => definition.volumes = names(value, path, "volumes")?,
                Some("networks") => definition.networks = names(value, path, "networks")?,
                _ => {
                    definition.extra.insert(key, value);
                }
            }
        }
        if !has_services {
            return Err(Error::structural(path, "missing top-level `services` key"));
        }

        tracing::debug!(
            path = %path.display(),
            services = definition.services.len(),
            "Parsed compose file"
        );
        Ok(definition)
    }

    /// Service named `name`.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&ComposeService> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// Services running a known database engine.
#[must_use]
pub fn database_services(definition: &ComposeDefinition) -> Vec<&ComposeService> {
    definition
        .services
        .iter()
        .filter(|service| service.is_database())
        .collect()
}

fn parse_services(value: Value, path: &Path) -> Result<Vec<ComposeService>> {
    let services = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(services) => services,
        _ => return Err(Error::structural(path, "`services` must be a mapping")),
    };

    services
        .into_iter()
        .map(|(name, body)| {
            let name = scalar(&name)
                .ok_or_else(|| Error::structural(path, "service names must be strings"))?;
            parse_service(name, body)
        })
        .collect()
}

fn parse_service(name: String, body: Value) -> Result<ComposeService> {
    let body = match body {
        Value::Null => Mapping::new(),
        Value::Mapping(body) => body,
        _ => return Err(Error::invalid_service(name, "expected a mapping")),
    };

    let mut service = ComposeService {
        name,
        ..ComposeService::default()
    };
    for (key, value) in body {
        let field = key.as_str().unwrap_or_default();
        match field {
            "image" => service.image = Some(required_scalar(&service.name, field, &value)?),
            "build" if value.is_string() => service.build = scalar(&value),
            "volumes" => {
                service.volumes = scalar_list(&service.name, field, value)?
                    .iter()
                    .map(|v| VolumeMount::parse(v))
                    .collect();
            }
            "ports" => {
                service.ports = scalar_list(&service.name, field, value)?
                    .iter()
                    .map(|p| PortMapping::parse(p))
                    .collect();
            }
            "labels" => {
                service.labels = list_or_map(&service.name, field, value)?
                    .into_iter()
                    .map(|(key, value)| match value {
                        Some(value) => format!("{key}={value}"),
                        None => key,
                    })
                    .collect();
            }
            "environment" => {
                service.environment = list_or_map(&service.name, field, value)?
                    .into_iter()
                    .map(|(key, value)| EnvironmentEntry { key, value })
                    .collect();
            }
            "networks" => {
                service.networks = list_or_map(&service.name, field, value)?
                    .into_iter()
                    .map(|(key, _)| key)
                    .collect();
            }
            _ => {
                service.extra.insert(key, value);
            }
        }
    }
    Ok(service)
}

/// Text of a string, number or boolean scalar.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn required_scalar(service: &str, field: &str, value: &Value) -> Result<String> {
    scalar(value).ok_or_else(|| Error::invalid_service(service, format!("`{field}` must be a string")))
}

fn scalar_list(service: &str, field: &str, value: Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                scalar(item).ok_or_else(|| {
                    Error::invalid_service(service, format!("`{field}` entries must use the short syntax"))
                })
            })
            .collect(),
        _ => Err(Error::invalid_service(service, format!("`{field}` must be a list"))),
    }
}

/// Normalize the list (`KEY=value`) and map (`KEY: value`) forms.
fn list_or_map(service: &str, field: &str, value: Value) -> Result<Vec<(String, Option<String>)>> {
    match value {
        Value::Mapping(entries) => entries
            .into_iter()
            .map(|(key, value)| {
                let key = required_scalar(service, field, &key)?;
                Ok((key, scalar(&value)))
            })
            .collect(),
        other => Ok(scalar_list(service, field, other)?
            .into_iter()
            .map(|entry| match entry.split_once('=') {
                Some((key, value)) => (key.to_string(), Some(value.to_string())),
                None => (entry, None),
            })
            .collect()),
    }
}

/// Names of top-level volumes or networks.
fn names(value: Value, path: &Path, field: &str) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Mapping(entries) => entries
            .keys()
            .map(|key| {
                scalar(key).ok_or_else(|| Error::structural(path, format!("`{field}` names must be strings")))
            })
            .collect(),
        Value::Sequence(entries) => entries
            .iter()
            .map(|entry| {
                scalar(entry).ok_or_else(|| Error::structural(path, format!("`{field}` names must be strings")))
            })
            .collect(),
        _ => Err(Error::structural(path, format!("`{field}` must be a mapping"))),
    }
}
