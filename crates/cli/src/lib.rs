//! Library half of the `monux` binary.
//!
//! Argument parsing, command dispatch and tracing setup live here so they
//! can be tested without spawning the binary.

pub mod cli;
pub mod commands;
pub mod tracing;
