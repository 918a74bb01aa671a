//! Command dispatch.
//!
//! Commands never print. They return an [`Outcome`] and `main` decides how
//! to render it.

pub mod compose;
pub mod env;
pub mod version;

use crate::cli::{CliError, Cli, Commands};
use monux_core::{FileStatus, Paths};
use monux_env::ValidationError;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Result of a command.
#[derive(Debug)]
pub enum Outcome {
    /// The command succeeded.
    Done {
        /// Human-readable output.
        text: String,
        /// Payload of the JSON envelope.
        data: Value,
    },
    /// Validation ran and found problems.
    Invalid(Vec<ValidationError>),
}

impl Outcome {
    /// Successful outcome.
    #[must_use]
    pub fn done(text: impl Into<String>, data: Value) -> Self {
        Self::Done {
            text: text.into(),
            data,
        }
    }
}

/// Run the parsed command.
///
/// # Errors
///
/// Returns the error of the failed operation.
#[instrument(skip(cli), fields(root = %cli.root.display()))]
pub fn execute(cli: &Cli) -> Result<Outcome, CliError> {
    match &cli.command {
        Commands::Version => Ok(version::execute()),
        Commands::Env { subcommand } => env::execute(subcommand, workspace(&cli.root)?),
        Commands::Compose { subcommand } => compose::execute(subcommand, workspace(&cli.root)?),
    }
}

fn workspace(root: &Path) -> Result<Paths, CliError> {
    if !root.is_dir() {
        return Err(CliError::config_with_help(
            format!("workspace root {} is not a directory", root.display()),
            "Pass --root or set MONUX_ROOT to the monorepo root",
        ));
    }
    Ok(Paths::from_root(root)?)
}

/// Outcome listing written files relative to `root`.
pub(crate) fn files_outcome(root: &Path, results: &[(PathBuf, FileStatus)]) -> Outcome {
    let entries: Vec<(String, FileStatus)> = results
        .iter()
        .map(|(path, status)| {
            let shown = path.strip_prefix(root).unwrap_or(path);
            (shown.display().to_string(), *status)
        })
        .collect();
    let text = entries
        .iter()
        .map(|(path, status)| format!("{status} {path}"))
        .collect::<Vec<_>>()
        .join("\n");
    let data = entries
        .iter()
        .map(|(path, status)| json!({ "path": path, "status": status.to_string() }))
        .collect();
    Outcome::done(text, Value::Array(data))
}
