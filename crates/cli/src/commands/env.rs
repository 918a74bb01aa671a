//! `monux env` subcommands.

use super::{Outcome, files_outcome};
use crate::cli::{CliError, EnvCommands};
use monux_core::{DeploymentTarget, Paths};
use monux_env::{EnvironmentEngine, StaticVariable};
use serde_json::json;
use tracing::{debug, instrument};

/// Run an environment subcommand against the workspace at `paths`.
///
/// # Errors
///
/// Returns the error of the failed engine operation.
#[instrument(skip_all)]
pub fn execute(command: &EnvCommands, paths: Paths) -> Result<Outcome, CliError> {
    let engine = EnvironmentEngine::new(paths);
    let root = engine.paths().root().to_path_buf();

    match command {
        EnvCommands::Init => Ok(files_outcome(&root, &engine.init()?)),
        EnvCommands::Get { key, target } => get(&engine, key, target.target),
        EnvCommands::Validate => {
            let errors = engine.validate()?;
            if errors.is_empty() {
                Ok(Outcome::done("Environment is valid", json!({ "errors": [] })))
            } else {
                Ok(Outcome::Invalid(errors))
            }
        }
        EnvCommands::AddStatic {
            key,
            value,
            var_type,
            public,
            optional,
        } => {
            let value = value
                .as_deref()
                .map(|raw| var_type.coerce(key, raw))
                .transpose()?;
            let variable = StaticVariable {
                key: key.clone(),
                value,
                required: !optional,
                var_type: *var_type,
            };
            engine.add_static_variable(&variable, *public)?;
            Ok(Outcome::done(
                format!("Added {key}"),
                json!({ "key": key, "type": var_type, "public": public }),
            ))
        }
        EnvCommands::Build { target, project } => {
            let results = match project {
                Some(project) => {
                    let status = engine.build_environment_file_for_app(project, target.target)?;
                    vec![(engine.paths().project_environment_file(project), status)]
                }
                None => engine.build_environment_files(target.target)?,
            };
            debug!(files = results.len(), target = %target.target, "Built environment files");
            Ok(files_outcome(&root, &results))
        }
        EnvCommands::Project { project, keys } => {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            let status = engine.setup_project_environment(project, &keys)?;
            let path = engine.paths().project_environment_model(project);
            Ok(files_outcome(&root, &[(path, status)]))
        }
    }
}

fn get(engine: &EnvironmentEngine, key: &str, target: DeploymentTarget) -> Result<Outcome, CliError> {
    let value = engine.get_env_variable(key, target)?;
    let text = value.as_ref().map_or_else(String::new, ToString::to_string);
    Ok(Outcome::done(
        text,
        json!({ "key": key, "target": target.name(), "value": value }),
    ))
}
