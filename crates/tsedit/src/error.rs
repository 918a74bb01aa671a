//! Error types for TypeScript editing.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for TypeScript editing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while locating, encoding or splicing generated TypeScript.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The marker text does not occur in the file.
    #[error("Marker '{marker}' not found{}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(monux::tsedit::marker_not_found),
        help("The generated section was removed or renamed; restore it or regenerate the file")
    )]
    MarkerNotFound {
        /// Text that was searched for.
        marker: String,
        /// File that was searched, when known.
        path: Option<PathBuf>,
    },

    /// The bracket opened at the marker is never closed.
    #[error("Unbalanced brackets after marker '{marker}' (line {line}){}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(monux::tsedit::unbalanced),
        help("Check the file for a missing closing bracket")
    )]
    Unbalanced {
        /// Marker whose region could not be closed.
        marker: String,
        /// Zero-based line the marker was found on.
        line: usize,
        /// File that was searched, when known.
        path: Option<PathBuf>,
    },

    /// The value cannot be expressed as a TypeScript literal.
    #[error("Cannot encode value as TypeScript: {description}")]
    #[diagnostic(code(monux::tsedit::unsupported_value))]
    UnsupportedValue {
        /// What was rejected.
        description: String,
    },

    /// The region at the marker is not the kind of literal the edit expects.
    #[error("Region at marker '{marker}' is not {expected}")]
    #[diagnostic(
        code(monux::tsedit::unexpected_region),
        help("Point the marker at the literal being edited")
    )]
    UnexpectedRegion {
        /// Marker of the region.
        marker: String,
        /// Expected literal kind (`an array`, `an object`).
        expected: &'static str,
    },

    /// An object entry with the same key and a different value already exists.
    #[error("Key '{key}' already exists at marker '{marker}' with a different value")]
    #[diagnostic(
        code(monux::tsedit::duplicate_entry),
        help("Remove or rename the existing entry first")
    )]
    DuplicateEntry {
        /// Marker of the object.
        marker: String,
        /// Conflicting key.
        key: String,
    },

    /// Error from a core file operation.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] monux_core::Error),
}

impl Error {
    /// Attach the file path to location errors that were raised on bare text.
    #[must_use]
    pub fn in_file(self, file: &Path) -> Self {
        match self {
            Self::MarkerNotFound { marker, path: None } => Self::MarkerNotFound {
                marker,
                path: Some(file.to_path_buf()),
            },
            Self::Unbalanced {
                marker,
                line,
                path: None,
            } => Self::Unbalanced {
                marker,
                line,
                path: Some(file.to_path_buf()),
            },
            other => other,
        }
    }

    /// Create an unsupported value error.
    pub fn unsupported(description: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_file_fills_missing_path() {
        let err = Error::MarkerNotFound {
            marker: "providers: [".to_string(),
            path: None,
        }
        .in_file(Path::new("app.config.ts"));
        assert!(err.to_string().contains("app.config.ts"));
    }

    #[test]
    fn test_in_file_keeps_other_errors() {
        let err = Error::unsupported("NaN").in_file(Path::new("x.ts"));
        assert!(matches!(err, Error::UnsupportedValue { .. }));
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: Error = monux_core::Error::FileNotFound {
            path: PathBuf::from("missing.ts"),
        }
        .into();
        assert_eq!(err.to_string(), "File not found: missing.ts");
    }
}
