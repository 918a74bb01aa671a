//! Error types for compose synthesis.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for compose operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading, extending or writing compose files.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// YAML parsing error.
    #[error("YAML parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(monux::compose::yaml_error),
        help("Ensure the compose file has valid YAML syntax")
    )]
    Yaml {
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },

    /// A service with the same name already exists in a compose file.
    #[error("Service '{name}' already exists in {}", path.display())]
    #[diagnostic(
        code(monux::compose::duplicate_service),
        help("Service names are unique per compose file; pick another name")
    )]
    DuplicateService {
        /// The rejected service name.
        name: String,
        /// Compose file that already has it.
        path: PathBuf,
    },

    /// `www` was requested as a sub-domain.
    #[error("Sub-domain '{sub_domain}' is reserved")]
    #[diagnostic(
        code(monux::compose::reserved_sub_domain),
        help("Omit the sub-domain to serve the root domain; www is redirected to it automatically")
    )]
    ReservedSubDomain {
        /// The rejected sub-domain.
        sub_domain: String,
    },

    /// A service entry uses a shape monux does not understand.
    #[error("Invalid service '{name}': {message}")]
    #[diagnostic(
        code(monux::compose::invalid_service),
        help("Use the short syntax for ports and volumes (\"8080:80\", \"data:/var/lib/data\")")
    )]
    InvalidService {
        /// Service name.
        name: String,
        /// What is wrong with it.
        message: String,
    },

    /// Error from a core file operation.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] monux_core::Error),
}

impl Error {
    /// Create an invalid-service error.
    pub fn invalid_service(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidService {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a structural mismatch error for `path`.
    pub fn structural(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Core(monux_core::Error::structural(path, message))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Yaml { source, path: None }
    }
}
