//! `monux compose` subcommands.

use super::{Outcome, files_outcome};
use crate::cli::{CliError, ComposeCommands};
use monux_compose::{
    ComposeEngine, ComposeService, ServiceOptions, database_services, get_traefik_labels,
};
use monux_core::Paths;
use serde_json::json;
use tracing::instrument;

/// Run a compose subcommand against the workspace at `paths`.
///
/// # Errors
///
/// Returns the error of the failed compose operation.
#[instrument(skip_all)]
pub fn execute(command: &ComposeCommands, paths: Paths) -> Result<Outcome, CliError> {
    let engine = ComposeEngine::new(paths);
    let root = engine.paths().root().to_path_buf();

    match command {
        ComposeCommands::Labels {
            name,
            port,
            target,
            sub_domain,
        } => {
            let labels = get_traefik_labels(name, *port, target.target, sub_domain.as_deref())?;
            Ok(Outcome::done(labels.join("\n"), json!(labels)))
        }
        ComposeCommands::AddService {
            name,
            image,
            build,
            dev_port,
            prod_port,
            public,
            sub_domain,
            target,
        } => {
            let service = match (image, build) {
                (Some(image), _) => ComposeService::with_image(name, image),
                (None, Some(build)) => ComposeService::with_build(name, build),
                (None, None) => {
                    return Err(CliError::config_with_help(
                        format!("service '{name}' has neither an image nor a build context"),
                        "Pass --image or --build",
                    ));
                }
            };
            let options = ServiceOptions {
                dev_port: *dev_port,
                prod_port: *prod_port,
                is_public: *public,
                sub_domain: sub_domain.clone(),
                compose_file: *target,
            };
            let results = engine.add_service_to_compose(&service, &options)?;
            Ok(files_outcome(&root, &results))
        }
        ComposeCommands::AddVolume { name, target } => {
            Ok(files_outcome(&root, &engine.add_volume_to_compose(name, *target)?))
        }
        ComposeCommands::AddNetwork { name, target } => {
            Ok(files_outcome(&root, &engine.add_network_to_compose(name, *target)?))
        }
        ComposeCommands::Databases { target } => {
            let definition = engine.definition(*target)?;
            let names: Vec<&str> = database_services(&definition)
                .into_iter()
                .map(|service| service.name.as_str())
                .collect();
            Ok(Outcome::done(names.join("\n"), json!(names)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::TargetArg;
    use monux_core::{Config, DeploymentTarget};
    use tempfile::TempDir;

    #[test]
    fn test_labels_for_local() {
        let temp = TempDir::new().unwrap();
        let outcome = execute(
            &ComposeCommands::Labels {
                name: "api".to_string(),
                port: 3000,
                target: TargetArg {
                    target: DeploymentTarget::Local,
                },
                sub_domain: Some("api".to_string()),
            },
            Paths::with_config(temp.path(), Config::default()),
        )
        .unwrap();
        let Outcome::Done { text, .. } = outcome else {
            panic!("expected success");
        };
        assert!(text.starts_with("traefik.enable=true\n"));
        assert!(text.contains("Host(`api.localhost`)"));
    }

    #[test]
    fn test_databases_lists_engines_only() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("docker-compose.yaml"),
            "services:\n    db:\n        image: postgres:16\n    web:\n        image: nginx\n",
        )
        .unwrap();
        let outcome = execute(
            &ComposeCommands::Databases {
                target: DeploymentTarget::Prod,
            },
            Paths::with_config(temp.path(), Config::default()),
        )
        .unwrap();
        let Outcome::Done { data, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(data, json!(["db"]));
    }
}
