//! Workspace configuration loaded from `monux.toml`.
//!
//! Every field has a default, so a workspace without a `monux.toml` behaves
//! exactly like one with an empty file.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the optional configuration file at the workspace root.
pub const CONFIG_FILE_NAME: &str = "monux.toml";

/// Layout of a monux workspace, relative to its root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// File holding the concrete values of all static variables.
    pub env_file: PathBuf,
    /// Committed template listing every static key, with values for public ones.
    pub public_env_file: PathBuf,
    /// Generated TypeScript model of the global environment.
    pub global_environment_model: PathBuf,
    /// Directories whose direct children are projects (apps and libraries).
    pub project_dirs: Vec<PathBuf>,
    /// Project-relative path of the file declaring a project's variable subset.
    pub project_environment_model: PathBuf,
    /// Project-relative path of the generated `environment.ts`.
    pub project_environment_file: PathBuf,
    /// Directory holding the per-target docker-compose files.
    pub compose_dir: PathBuf,
    /// Shared TypeScript configuration receiving path aliases.
    pub tsconfig: PathBuf,
    /// String values emitted as raw TypeScript instead of quoted literals,
    /// mapped to the source text they stand for.
    pub opaque_expressions: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env_file: PathBuf::from(".env"),
            public_env_file: PathBuf::from(".env.public"),
            global_environment_model: PathBuf::from("environment.global-model.ts"),
            project_dirs: vec![PathBuf::from("apps"), PathBuf::from("libs")],
            project_environment_model: PathBuf::from("src/environment/environment.model.ts"),
            project_environment_file: PathBuf::from("src/environment/environment.ts"),
            compose_dir: PathBuf::from("."),
            tsconfig: PathBuf::from("tsconfig.base.json"),
            opaque_expressions: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load `monux.toml` from `root`, falling back to defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.exists() {
            tracing::debug!(root = %root.display(), "No monux.toml found, using defaults");
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&path).map_err(|e| Error::io(e, &path, "reading config"))?;
        Self::parse(&content).map_err(|source| Error::Toml {
            source,
            path: Some(path),
        })
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the text is invalid or contains unknown keys.
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_override() {
        let config = Config::parse(
            r#"
env-file = "config/.env"
project-dirs = ["apps"]
"#,
        )
        .unwrap();

        assert_eq!(config.env_file, PathBuf::from("config/.env"));
        assert_eq!(config.project_dirs, vec![PathBuf::from("apps")]);
        assert_eq!(config.public_env_file, PathBuf::from(".env.public"));
    }

    #[test]
    fn test_opaque_expressions_table() {
        let config = Config::parse(
            r#"
[opaque-expressions]
HTTP_INTERCEPTORS = "HTTP_INTERCEPTORS"
"provideHttpClient()" = "provideHttpClient(withInterceptorsFromDi())"
"#,
        )
        .unwrap();

        assert_eq!(config.opaque_expressions.len(), 2);
        assert_eq!(
            config.opaque_expressions["provideHttpClient()"],
            "provideHttpClient(withInterceptorsFromDi())"
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::parse("envfile = \".env\"").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid_file_reports_path() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "env-file = [").unwrap();

        let err = Config::load(temp.path()).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
