//! Error types for the environment engine.

use miette::Diagnostic;
use monux_core::DeploymentTarget;
use thiserror::Error;

/// Result type for environment operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while declaring, resolving or generating environment variables.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The variable is not declared in the global environment model.
    #[error("Environment variable '{key}' is not declared")]
    #[diagnostic(
        code(monux::env::not_found),
        help("Declare it with `monux env add-static` or add it to the global environment model")
    )]
    NotFound {
        /// The requested key.
        key: String,
    },

    /// The key is already declared or already present in an env file.
    #[error("Environment variable '{key}' already exists in {location}")]
    #[diagnostic(
        code(monux::env::duplicate_key),
        help("Variable keys are global; pick another name or remove the existing declaration")
    )]
    DuplicateKey {
        /// The rejected key.
        key: String,
        /// Where the existing key was found.
        location: String,
    },

    /// The key is not a snake_case identifier.
    #[error("Invalid environment variable key '{key}'")]
    #[diagnostic(
        code(monux::env::invalid_key),
        help("Keys are snake_case: lowercase letters, digits and underscores, starting with a letter")
    )]
    InvalidKey {
        /// The rejected key.
        key: String,
    },

    /// A calculated variable has no branch for the target.
    #[error("Calculated variable '{key}' has no value for target '{target}'")]
    #[diagnostic(
        code(monux::env::missing_value),
        help("Add a `case` for the target or a `default:` branch to its calculation")
    )]
    MissingValue {
        /// The calculated key.
        key: String,
        /// Target without a branch.
        target: DeploymentTarget,
    },

    /// A new calculated variable does not cover every target.
    #[error("Calculation for '{key}' does not cover {}", missing.iter().map(|t| t.name()).collect::<Vec<_>>().join(", "))]
    #[diagnostic(
        code(monux::env::incomplete_calculation),
        help("Define a value for every target, or a default")
    )]
    IncompleteCalculation {
        /// The calculated key.
        key: String,
        /// Targets without a value.
        missing: Vec<DeploymentTarget>,
    },

    /// A calculation reads a variable that is not a declared static variable.
    #[error("Calculation for '{key}' references undeclared static variable '{reference}'")]
    #[diagnostic(
        code(monux::env::unresolved_reference),
        help("Calculations can only read static variables; declare the referenced variable first")
    )]
    UnresolvedReference {
        /// The calculated key.
        key: String,
        /// The unknown reference.
        reference: String,
    },

    /// A calculation returns a value of another type than its declaration.
    #[error("Calculation for '{key}' returns a {found}, but '{key}' is declared as {expected}")]
    #[diagnostic(
        code(monux::env::calculation_type),
        help("Return a value of the declared type from every branch, or change the declared type")
    )]
    CalculationType {
        /// The calculated key.
        key: String,
        /// Declared type.
        expected: &'static str,
        /// Type returned by a branch.
        found: &'static str,
    },

    /// A calculation in the global model could not be read back.
    #[error("Cannot read calculation for '{key}': {message}")]
    #[diagnostic(
        code(monux::env::invalid_calculation),
        help("Calculations return string, number or boolean literals, `env.<key>` references, or template literals over them, from a `switch (target)`")
    )]
    InvalidCalculation {
        /// The calculated key.
        key: String,
        /// What could not be understood.
        message: String,
    },

    /// A declaration in a type block could not be read back.
    #[error("Invalid declaration '{declaration}' in {block}")]
    #[diagnostic(
        code(monux::env::invalid_declaration),
        help("Declarations have the form `key: string`, `key?: number` or `key: boolean`")
    )]
    InvalidDeclaration {
        /// The declaration text.
        declaration: String,
        /// Type block it was found in.
        block: &'static str,
    },

    /// A static value does not match its declared type.
    #[error("Value '{value}' of '{key}' is not a valid {expected}")]
    #[diagnostic(
        code(monux::env::invalid_value),
        help("Fix the value in the .env file; `monux env validate` lists every invalid entry")
    )]
    InvalidValue {
        /// The static key.
        key: String,
        /// Raw value from `.env`.
        value: String,
        /// Declared type.
        expected: &'static str,
    },

    /// Error while editing generated TypeScript.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tsedit(#[from] monux_tsedit::Error),

    /// Error from a core file operation.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] monux_core::Error),
}

impl Error {
    /// Create a not-found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create an invalid calculation error.
    pub fn invalid_calculation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCalculation {
            key: key.into(),
            message: message.into(),
        }
    }
}
