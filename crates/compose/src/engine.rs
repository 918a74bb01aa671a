//! Adding services, volumes and networks to the per-target compose files.
//!
//! Every operation reads the whole file, changes the parsed definition and
//! writes the re-serialized definition back.

use crate::error::{Error, Result};
use crate::model::{ComposeDefinition, ComposeService, PortMapping};
use crate::traefik::{check_sub_domain, get_traefik_labels};
use crate::yaml;
use monux_core::fs::write_if_changed;
use monux_core::{DeploymentTarget, FileStatus, Paths, SourceFile};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Parse the compose file at `path`.
///
/// # Errors
///
/// Returns [`monux_core::Error::FileNotFound`] if the file does not exist,
/// plus the errors of [`ComposeDefinition::from_yaml`].
pub fn parse_compose(path: &Path) -> Result<ComposeDefinition> {
    let file = SourceFile::open(path)?;
    ComposeDefinition::from_yaml(&file.content(), path)
}

/// How a service is wired into the compose files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Host port published in the dev file.
    pub dev_port: Option<u16>,
    /// Port the container listens on.
    pub prod_port: Option<u16>,
    /// Route the service through traefik outside dev.
    pub is_public: bool,
    /// Sub-domain to route; the root domain when absent.
    pub sub_domain: Option<String>,
    /// Only change the file of this target.
    pub compose_file: Option<DeploymentTarget>,
}

/// Edits the compose files of one workspace.
#[derive(Debug, Clone)]
pub struct ComposeEngine {
    paths: Paths,
}

impl ComposeEngine {
    /// Create an engine for the workspace described by `paths`.
    #[must_use]
    pub const fn new(paths: Paths) -> Self {
        Self { paths }
    }

    /// Workspace paths.
    #[must_use]
    pub const fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Parsed compose file of `target`; empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ComposeDefinition::from_yaml`].
    pub fn definition(&self, target: DeploymentTarget) -> Result<ComposeDefinition> {
        let path = self.paths.compose_file(target);
        if path.exists() {
            parse_compose(&path)
        } else {
            debug!(path = %path.display(), "Compose file missing, starting empty");
            Ok(ComposeDefinition::default())
        }
    }

    /// Add `service` to every compose file, or to the one in `options`.
    ///
    /// The dev file publishes `dev_port:prod_port`. Other targets get
    /// traefik labels after the service's own labels when it is public.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateService`] before any file is written if a
    /// file already has a service of that name, [`Error::ReservedSubDomain`]
    /// for the `www` sub-domain, and [`Error::InvalidService`] for a public
    /// service without a port.
    pub fn add_service_to_compose(
        &self,
        service: &ComposeService,
        options: &ServiceOptions,
    ) -> Result<Vec<(PathBuf, FileStatus)>> {
        check_sub_domain(options.sub_domain.as_deref())?;
        let mut updates = Vec::new();
        for target in targets(options.compose_file) {
            let path = self.paths.compose_file(target);
            let mut definition = self.definition(target)?;
            if definition.service(&service.name).is_some() {
                return Err(Error::DuplicateService {
                    name: service.name.clone(),
                    path,
                });
            }

            let mut service = service.clone();
            if target == DeploymentTarget::Dev {
                if let Some(dev_port) = options.dev_port {
                    service
                        .ports
                        .push(PortMapping::new(dev_port, options.prod_port.unwrap_or(dev_port)));
                }
            } else if options.is_public {
                let port = options
                    .prod_port
                    .or(options.dev_port)
                    .ok_or_else(|| Error::invalid_service(&service.name, "public services need a port"))?;
                let labels =
                    get_traefik_labels(&service.name, port, target, options.sub_domain.as_deref())?;
                service.labels.extend(labels);
            }
            definition.services.push(service);
            updates.push((path, definition));
        }

        let results = write_all(updates)?;
        info!(service = %service.name, files = results.len(), "Added compose service");
        Ok(results)
    }

    /// Add a named volume to every compose file, or to `compose_file`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be parsed or written.
    pub fn add_volume_to_compose(
        &self,
        name: &str,
        compose_file: Option<DeploymentTarget>,
    ) -> Result<Vec<(PathBuf, FileStatus)>> {
        self.add_named(name, compose_file, |definition| &mut definition.volumes)
    }

    /// Add a named network to every compose file, or to `compose_file`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be parsed or written.
    pub fn add_network_to_compose(
        &self,
        name: &str,
        compose_file: Option<DeploymentTarget>,
    ) -> Result<Vec<(PathBuf, FileStatus)>> {
        self.add_named(name, compose_file, |definition| &mut definition.networks)
    }

    fn add_named(
        &self,
        name: &str,
        compose_file: Option<DeploymentTarget>,
        section: impl Fn(&mut ComposeDefinition) -> &mut Vec<String>,
    ) -> Result<Vec<(PathBuf, FileStatus)>> {
        let mut updates = Vec::new();
        for target in targets(compose_file) {
            let mut definition = self.definition(target)?;
            let names = section(&mut definition);
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
            updates.push((self.paths.compose_file(target), definition));
        }
        write_all(updates)
    }
}

fn targets(compose_file: Option<DeploymentTarget>) -> Vec<DeploymentTarget> {
    compose_file.map_or_else(|| DeploymentTarget::ALL.to_vec(), |target| vec![target])
}

fn write_all(updates: Vec<(PathBuf, ComposeDefinition)>) -> Result<Vec<(PathBuf, FileStatus)>> {
    updates
        .into_iter()
        .map(|(path, definition)| {
            let status = write_if_changed(&path, &yaml::render(&definition))?;
            Ok((path, status))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use monux_core::Config;
    use tempfile::TempDir;

    fn engine(temp: &TempDir) -> ComposeEngine {
        ComposeEngine::new(Paths::with_config(temp.path(), Config::default()))
    }

    #[test]
    fn test_add_service_to_all_targets() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);
        let options = ServiceOptions {
            dev_port: Some(4201),
            prod_port: Some(80),
            is_public: true,
            sub_domain: Some("admin".to_string()),
            compose_file: None,
        };
        let results = engine
            .add_service_to_compose(&ComposeService::with_build("admin", "./apps/admin"), &options)
            .unwrap();
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|(_, s)| *s == FileStatus::Created));

        let dev = engine.definition(DeploymentTarget::Dev).unwrap();
        let admin = dev.service("admin").unwrap();
        assert_eq!(admin.ports, [PortMapping::new(4201, 80)]);
        assert!(admin.labels.is_empty());

        let prod = engine.definition(DeploymentTarget::Prod).unwrap();
        let admin = prod.service("admin").unwrap();
        assert!(admin.ports.is_empty());
        assert_eq!(admin.labels[0], "traefik.enable=true");
    }

    #[test]
    fn test_duplicate_rejected_before_writes() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);
        let prod = engine.paths().compose_file(DeploymentTarget::Prod);
        std::fs::write(&prod, "services:\n    admin:\n        image: nginx\n").unwrap();

        let err = engine
            .add_service_to_compose(&ComposeService::with_image("admin", "nginx"), &ServiceOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateService { .. }));
        assert!(!engine.paths().compose_file(DeploymentTarget::Dev).exists());
    }

    #[test]
    fn test_public_service_needs_port() {
        let temp = TempDir::new().unwrap();
        let options = ServiceOptions {
            is_public: true,
            ..ServiceOptions::default()
        };
        let err = engine(&temp)
            .add_service_to_compose(&ComposeService::with_image("web", "nginx"), &options)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidService { .. }));
    }

    #[test]
    fn test_add_volume_once() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);
        engine
            .add_volume_to_compose("db-data", Some(DeploymentTarget::Local))
            .unwrap();
        let results = engine
            .add_volume_to_compose("db-data", Some(DeploymentTarget::Local))
            .unwrap();
        assert_eq!(results[0].1, FileStatus::Unchanged);
        assert_eq!(
            engine.definition(DeploymentTarget::Local).unwrap().volumes,
            ["db-data"]
        );
        assert!(!engine.paths().compose_file(DeploymentTarget::Prod).exists());
    }

    #[test]
    fn test_add_network_everywhere() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);
        let results = engine.add_network_to_compose("traefik", None).unwrap();
        assert_eq!(results.len(), 4);
        for target in DeploymentTarget::ALL {
            assert_eq!(engine.definition(target).unwrap().networks, ["traefik"]);
        }
    }
}
