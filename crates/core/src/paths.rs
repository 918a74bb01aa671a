//! Centralized path management for a monux workspace.
//!
//! All engines receive a [`Paths`] value instead of consulting the process
//! working directory, so tests point them at a temporary workspace by
//! constructing one explicitly.
//!
//! | File | Default location |
//! |------|------------------|
//! | static values | `<root>/.env` |
//! | public template | `<root>/.env.public` |
//! | global model | `<root>/environment.global-model.ts` |
//! | compose files | `<root>/{dev.,local.,stage.,}docker-compose.yaml` |
//! | project model | `<root>/<project>/src/environment/environment.model.ts` |
//! | project environment | `<root>/<project>/src/environment/environment.ts` |

use crate::config::Config;
use crate::target::DeploymentTarget;
use crate::Result;
use std::path::{Path, PathBuf};

/// Resolved locations of every file the engines read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
    config: Config,
}

impl Paths {
    /// Build paths for `root` using its `monux.toml` (or defaults).
    ///
    /// # Errors
    ///
    /// Returns an error if `monux.toml` exists but is invalid.
    pub fn from_root(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = Config::load(&root)?;
        Ok(Self { root, config })
    }

    /// Build paths for `root` with an explicit configuration.
    #[must_use]
    pub fn with_config(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Workspace root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The configuration these paths were built from.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the `.env` file.
    #[must_use]
    pub fn env_file(&self) -> PathBuf {
        self.root.join(&self.config.env_file)
    }

    /// Path of the committed public `.env` template.
    #[must_use]
    pub fn public_env_file(&self) -> PathBuf {
        self.root.join(&self.config.public_env_file)
    }

    /// Path of the generated global environment model.
    #[must_use]
    pub fn global_environment_model(&self) -> PathBuf {
        self.root.join(&self.config.global_environment_model)
    }

    /// Path of the compose file for `target`.
    #[must_use]
    pub fn compose_file(&self, target: DeploymentTarget) -> PathBuf {
        self.root
            .join(&self.config.compose_dir)
            .join(target.compose_file_name())
    }

    /// Directories that contain projects.
    pub fn project_dirs(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.config.project_dirs.iter().map(|dir| self.root.join(dir))
    }

    /// Absolute directory of a project given relative to the root (`apps/admin`).
    #[must_use]
    pub fn project_dir(&self, project: &Path) -> PathBuf {
        if project.is_absolute() {
            project.to_path_buf()
        } else {
            self.root.join(project)
        }
    }

    /// Path of a project's environment model file.
    #[must_use]
    pub fn project_environment_model(&self, project: &Path) -> PathBuf {
        self.project_dir(project)
            .join(&self.config.project_environment_model)
    }

    /// Path of a project's generated `environment.ts`.
    #[must_use]
    pub fn project_environment_file(&self, project: &Path) -> PathBuf {
        self.project_dir(project)
            .join(&self.config.project_environment_file)
    }

    /// Path of the shared TypeScript configuration.
    #[must_use]
    pub fn tsconfig(&self) -> PathBuf {
        self.root.join(&self.config.tsconfig)
    }
}
