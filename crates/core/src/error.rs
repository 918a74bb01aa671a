//! Error types for core workspace operations.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, mutating or writing workspace files.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A file that an operation depends on does not exist.
    #[error("File not found: {}", path.display())]
    #[diagnostic(
        code(monux::core::file_not_found),
        help("Check that the workspace root is correct, or re-run the scaffolding step that creates this file")
    )]
    FileNotFound {
        /// The path that was expected to exist.
        path: PathBuf,
    },

    /// A literal text replacement did not match exactly one location.
    #[error("Expected exactly one occurrence of the replaced text in {}, found {occurrences}", path.display())]
    #[diagnostic(
        code(monux::core::ambiguous_replacement),
        help("The generated file was probably edited by hand; restore the generated section and retry")
    )]
    AmbiguousReplacement {
        /// File being edited.
        path: PathBuf,
        /// How many times the text was found.
        occurrences: usize,
    },

    /// A line index or range lies outside the file.
    #[error("Line range {start}..={end} is out of bounds for {} ({len} lines)", path.display())]
    #[diagnostic(code(monux::core::line_out_of_range))]
    LineOutOfRange {
        /// File being edited.
        path: PathBuf,
        /// First line of the requested range.
        start: usize,
        /// Last line of the requested range.
        end: usize,
        /// Number of lines in the file.
        len: usize,
    },

    /// An unknown deployment target was requested.
    #[error("Unknown deployment target '{value}'")]
    #[diagnostic(
        code(monux::core::invalid_target),
        help("Valid targets: dev, local, stage, prod (or the matching docker-compose file name)")
    )]
    InvalidTarget {
        /// The rejected value.
        value: String,
    },

    /// A structured file did not have the expected shape.
    #[error("Unexpected structure in {}: {message}", path.display())]
    #[diagnostic(
        code(monux::core::structural_mismatch),
        help("Fix the file by hand or regenerate it from a clean state")
    )]
    StructuralMismatch {
        /// File with the unexpected structure.
        path: PathBuf,
        /// What was expected.
        message: String,
    },

    /// I/O error occurred.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(monux::core::io_error),
        help("Check that the referenced paths exist and that you have permission to read or write them")
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },

    /// JSON parsing error.
    #[error("JSON parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(monux::core::json_error),
        help("Ensure the JSON file has valid syntax")
    )]
    Json {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },

    /// TOML parsing error in `monux.toml`.
    #[error("TOML parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(monux::core::toml_error),
        help("Check monux.toml for syntax errors or unknown keys")
    )]
    Toml {
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },
}

impl Error {
    /// Wrap an I/O error with the path and operation it happened in.
    pub fn io(source: std::io::Error, path: impl AsRef<Path>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().to_path_buf()),
            operation: operation.into(),
        }
    }

    /// Create a structural mismatch error.
    pub fn structural(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "file operation".to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source, path: None }
    }
}

impl From<toml::de::Error> for Error {
    fn from(source: toml::de::Error) -> Self {
        Self::Toml { source, path: None }
    }
}
