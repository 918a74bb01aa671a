//! monux command-line entry point.

// The binary is where command output reaches stdout and stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use monux::cli::{
    self, CliError, EXIT_INVALID, EXIT_OK, InvalidEnvelope, OkEnvelope, exit_code_for,
    render_error,
};
use monux::commands::{self, Outcome};
use monux::tracing::{TracingConfig, TracingFormat, init_tracing};
use monux_env::ValidationError;

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();
    let json_mode = cli.json;

    let tracing_config = TracingConfig {
        format: if json_mode {
            TracingFormat::Json
        } else {
            cli.log_format
        },
        level: cli.level.into(),
    };
    if let Err(error) = init_tracing(tracing_config) {
        eprintln!("{error:?}");
    }

    let exit_code = match commands::execute(&cli) {
        Ok(Outcome::Done { text, data }) => {
            if json_mode {
                print_json(&OkEnvelope::new(data));
            } else if !text.is_empty() {
                println!("{text}");
            }
            EXIT_OK
        }
        Ok(Outcome::Invalid(errors)) => report_invalid(&errors, json_mode),
        Err(err) => fail(err, json_mode),
    };
    std::process::exit(exit_code);
}

/// Show every validation error, then fail with [`EXIT_INVALID`].
fn report_invalid(errors: &[ValidationError], json_mode: bool) -> i32 {
    if json_mode {
        print_json(&InvalidEnvelope::new(errors));
        return EXIT_INVALID;
    }
    for error in errors {
        println!("{error}");
    }
    fail(
        CliError::Invalid {
            count: errors.len(),
        },
        json_mode,
    )
}

fn fail(err: CliError, json_mode: bool) -> i32 {
    let code = exit_code_for(&err);
    render_error(err, json_mode);
    code
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing response: {e}"),
    }
}
