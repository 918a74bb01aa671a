//! Core types and utilities for monux.
//!
//! This crate holds the pieces every other monux crate builds on:
//!
//! - [`DeploymentTarget`]: the four deployment environments and their compose files
//! - [`Config`] and [`Paths`]: workspace layout, injected into every engine
//! - [`fs`]: idempotent line-based file mutation primitives
//! - [`json`]: deep merge for JSON configuration files

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod fs;
pub mod json;
pub mod paths;
pub mod target;

pub use config::Config;
pub use error::{Error, Result};
pub use fs::{FileStatus, SourceFile};
pub use paths::Paths;
pub use target::DeploymentTarget;
