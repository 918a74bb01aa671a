//! Static and calculated environment variables for monux workspaces.
//!
//! Static variables hold a literal value in `.env`. Calculated variables
//! derive a value per [`DeploymentTarget`](monux_core::DeploymentTarget)
//! from static variables. Both are declared in a generated TypeScript model
//! (`environment.global-model.ts`) that the engine reads back as its
//! database. Each project lists the keys it uses and gets a generated
//! `environment.ts` holding their resolved values.
//!
//! ```no_run
//! use monux_core::{DeploymentTarget, Paths};
//! use monux_env::{EnvironmentEngine, StaticVariable};
//!
//! # fn main() -> monux_env::Result<()> {
//! let engine = EnvironmentEngine::new(Paths::from_root(".")?);
//! engine.add_static_variable(&StaticVariable::new("api_port", 4201.0), true)?;
//! let port = engine.get_env_variable("api_port", DeploymentTarget::Dev)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod calculation;
pub mod dotenv;
pub mod engine;
pub mod error;
pub mod model;
pub mod project;
pub mod validate;
pub mod variable;

pub use calculation::{Calculation, StaticEnvironment, TemplatePart, ValueExpr};
pub use engine::EnvironmentEngine;
pub use error::{Error, Result};
pub use model::{EnvironmentModel, VariableKind};
pub use validate::{ValidationError, ValidationReason};
pub use variable::{
    CalculatedVariable, Declaration, EnvValue, StaticVariable, VariableType, is_valid_key,
};
