use crate::tracing::{LogLevel, TracingFormat};
use clap::{Args, Parser, Subcommand};
use miette::{Diagnostic, Report};
use monux_core::DeploymentTarget;
use monux_env::{ValidationError, VariableType};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// The environment did not validate
pub const EXIT_INVALID: i32 = 1;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// A workspace file could not be read or edited
pub const EXIT_EDIT: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(monux::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },

    /// Validation found problems (exit code 1)
    #[error("Environment is invalid: {count} problem(s) found")]
    #[diagnostic(
        code(monux::cli::invalid),
        help("Fix the listed variables in .env or the environment model")
    )]
    Invalid {
        /// Number of validation errors
        count: usize,
    },

    /// Core error (exit code 3)
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] monux_core::Error),

    /// Environment engine error (exit code 3)
    #[error(transparent)]
    #[diagnostic(transparent)]
    Env(#[from] monux_env::Error),

    /// Compose error (exit code 3)
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compose(#[from] monux_compose::Error),
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Invalid { .. } => EXIT_INVALID,
        CliError::Config { .. } | CliError::Core(monux_core::Error::Toml { .. }) => EXIT_CLI,
        CliError::Core(_) | CliError::Env(_) | CliError::Compose(_) => EXIT_EDIT,
    }
}

/// Render error appropriately based on JSON flag
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_error(err: CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": err.code().map(|code| code.to_string()),
            "message": err.to_string(),
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err);
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Validation report for JSON output; validation failures still carry data.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidEnvelope<'a> {
    /// Always "invalid"
    pub status: &'static str,
    /// Every validation error found
    pub errors: &'a [ValidationError],
}

impl<'a> InvalidEnvelope<'a> {
    /// Create a new validation envelope
    #[must_use]
    pub const fn new(errors: &'a [ValidationError]) -> Self {
        Self {
            status: "invalid",
            errors,
        }
    }
}

/// Parse a deployment target from its name or compose file name.
fn parse_target(value: &str) -> Result<DeploymentTarget, String> {
    value.parse().map_err(|e: monux_core::Error| e.to_string())
}

/// Main CLI entry point for monux.
#[derive(Parser, Debug)]
#[command(name = "monux")]
#[command(about = "Scaffold and maintain a TypeScript monorepo deployed with docker-compose")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory.
    #[arg(
        long,
        global = true,
        env = "MONUX_ROOT",
        default_value = ".",
        help = "Workspace root directory"
    )]
    pub root: PathBuf,

    /// Logging verbosity level.
    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Format of log events on stderr.
    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,

    /// Emit JSON envelope instead of text.
    #[arg(long, global = true, help = "Emit JSON envelope instead of text")]
    pub json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information.
    #[command(about = "Show version information")]
    Version,
    /// Environment variable operations.
    #[command(about = "Environment variable operations")]
    Env {
        /// Environment subcommand to execute.
        #[command(subcommand)]
        subcommand: EnvCommands,
    },
    /// docker-compose operations.
    #[command(about = "docker-compose operations")]
    Compose {
        /// Compose subcommand to execute.
        #[command(subcommand)]
        subcommand: ComposeCommands,
    },
}

/// Target selection shared by commands that resolve values.
#[derive(Args, Debug, Clone, Copy)]
pub struct TargetArg {
    /// Deployment target (dev, local, stage, prod, or a compose file name).
    #[arg(
        long,
        short = 't',
        help = "Deployment target (dev, local, stage, prod)",
        default_value = "dev",
        value_parser = parse_target
    )]
    pub target: DeploymentTarget,
}

/// Environment variable subcommands.
#[derive(Subcommand, Debug)]
pub enum EnvCommands {
    /// Create the environment model and `.env` if missing.
    #[command(about = "Create the environment model and .env if missing")]
    Init,
    /// Resolve one variable for a target.
    #[command(about = "Resolve one variable for a target")]
    Get {
        /// Variable key.
        key: String,
        #[command(flatten)]
        target: TargetArg,
    },
    /// Check `.env` against the environment model.
    #[command(about = "Check .env against the environment model")]
    Validate,
    /// Declare a static variable and store its value.
    #[command(about = "Declare a static variable and store its value")]
    AddStatic {
        /// Variable key (snake_case).
        key: String,
        /// Value written to `.env`; omitted leaves the entry empty.
        value: Option<String>,
        /// Declared type.
        #[arg(long = "type", default_value = "string", help = "string, number or boolean")]
        var_type: VariableType,
        /// Also write the value to `.env.public`.
        #[arg(long, help = "Also write the value to .env.public")]
        public: bool,
        /// Declare the variable as optional.
        #[arg(long, help = "Declare the variable as optional")]
        optional: bool,
    },
    /// Generate `environment.ts` files.
    #[command(about = "Generate environment.ts files")]
    Build {
        #[command(flatten)]
        target: TargetArg,
        /// Only build this project (relative to the root).
        #[arg(long, short = 'p', help = "Only build this project")]
        project: Option<PathBuf>,
    },
    /// Select the variables a project uses.
    #[command(about = "Select the variables a project uses")]
    Project {
        /// Project directory relative to the root.
        project: PathBuf,
        /// Variable keys to expose.
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

/// Compose subcommands.
#[derive(Subcommand, Debug)]
pub enum ComposeCommands {
    /// Print the traefik labels for a service.
    #[command(about = "Print the traefik labels for a service")]
    Labels {
        /// Service name.
        name: String,
        /// Container port.
        #[arg(long)]
        port: u16,
        #[command(flatten)]
        target: TargetArg,
        /// Sub-domain to route.
        #[arg(long)]
        sub_domain: Option<String>,
    },
    /// Add a service to the compose files.
    #[command(about = "Add a service to the compose files")]
    AddService {
        /// Service name.
        name: String,
        /// Image to run.
        #[arg(long, conflicts_with = "build", required_unless_present = "build")]
        image: Option<String>,
        /// Build context.
        #[arg(long)]
        build: Option<String>,
        /// Host port published in the dev file.
        #[arg(long)]
        dev_port: Option<u16>,
        /// Port the container listens on.
        #[arg(long)]
        prod_port: Option<u16>,
        /// Route the service through traefik.
        #[arg(long)]
        public: bool,
        /// Sub-domain to route.
        #[arg(long)]
        sub_domain: Option<String>,
        /// Only change this target's file.
        #[arg(long, short = 't', value_parser = parse_target)]
        target: Option<DeploymentTarget>,
    },
    /// Add a named volume.
    #[command(about = "Add a named volume")]
    AddVolume {
        /// Volume name.
        name: String,
        /// Only change this target's file.
        #[arg(long, short = 't', value_parser = parse_target)]
        target: Option<DeploymentTarget>,
    },
    /// Add a named network.
    #[command(about = "Add a named network")]
    AddNetwork {
        /// Network name.
        name: String,
        /// Only change this target's file.
        #[arg(long, short = 't', value_parser = parse_target)]
        target: Option<DeploymentTarget>,
    },
    /// List database services.
    #[command(about = "List database services")]
    Databases {
        /// Compose file to inspect.
        #[arg(long, short = 't', default_value = "prod", value_parser = parse_target)]
        target: DeploymentTarget,
    },
}

/// Parse the process arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["monux", "version"]).unwrap();

        assert!(matches!(cli.level, LogLevel::Warn));
        assert_eq!(cli.log_format, TracingFormat::Compact);
        assert!(!cli.json);
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_cli_log_level_parsing() {
        let cli = Cli::try_parse_from(["monux", "--level", "debug", "version"]).unwrap();
        assert!(matches!(cli.level, LogLevel::Debug));

        let cli = Cli::try_parse_from(["monux", "version", "-l", "error"]).unwrap();
        assert!(matches!(cli.level, LogLevel::Error));

        let cli = Cli::try_parse_from(["monux", "--log-format", "pretty", "version"]).unwrap();
        assert_eq!(cli.log_format, TracingFormat::Pretty);

        assert!(Cli::try_parse_from(["monux", "--level", "loud", "version"]).is_err());
    }

    #[test]
    fn test_env_get_target() {
        let cli = Cli::try_parse_from([
            "monux",
            "env",
            "get",
            "test_port",
            "--target",
            "dev.docker-compose.yaml",
        ])
        .unwrap();
        match cli.command {
            Commands::Env {
                subcommand: EnvCommands::Get { key, target },
            } => {
                assert_eq!(key, "test_port");
                assert_eq!(target.target, DeploymentTarget::Dev);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["monux", "env", "get", "k", "-t", "qa"]).is_err());
    }

    #[test]
    fn test_add_static_flags() {
        let cli = Cli::try_parse_from([
            "monux",
            "--json",
            "env",
            "add-static",
            "test_port",
            "4201",
            "--type",
            "number",
            "--public",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Env {
                subcommand:
                    EnvCommands::AddStatic {
                        key,
                        value,
                        var_type,
                        public,
                        optional,
                    },
            } => {
                assert_eq!(key, "test_port");
                assert_eq!(value.as_deref(), Some("4201"));
                assert_eq!(var_type, VariableType::Number);
                assert!(public);
                assert!(!optional);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_add_service_needs_image_or_build() {
        assert!(Cli::try_parse_from(["monux", "compose", "add-service", "web"]).is_err());
        assert!(
            Cli::try_parse_from([
                "monux",
                "compose",
                "add-service",
                "web",
                "--image",
                "nginx",
                "--build",
                "./apps/web",
            ])
            .is_err()
        );
        assert!(
            Cli::try_parse_from(["monux", "compose", "add-service", "web", "--image", "nginx"])
                .is_ok()
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&CliError::config("bad")), EXIT_CLI);
        assert_eq!(exit_code_for(&CliError::Invalid { count: 2 }), EXIT_INVALID);
        assert_eq!(
            exit_code_for(&CliError::Env(monux_env::Error::not_found("x"))),
            EXIT_EDIT
        );
    }

    #[test]
    fn test_envelopes() {
        let ok = OkEnvelope::new("data");
        assert_eq!(ok.status, "ok");
        let err = ErrorEnvelope::new("oops");
        assert_eq!(err.status, "error");
        assert_eq!(
            serde_json::to_string(&InvalidEnvelope::new(&[])).unwrap(),
            r#"{"status":"invalid","errors":[]}"#
        );
    }
}
