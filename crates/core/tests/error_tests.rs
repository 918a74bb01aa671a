//! Tests for error types

use miette::Diagnostic;
use monux_core::Error;
use std::path::Path;

#[test]
fn test_file_not_found_error() {
    let error = Error::FileNotFound {
        path: Path::new("/repo/.env").to_path_buf(),
    };
    assert_eq!(error.to_string(), "File not found: /repo/.env");
    assert_eq!(
        error.code().map(|c| c.to_string()),
        Some("monux::core::file_not_found".to_string())
    );
}

#[test]
fn test_structural_error() {
    let error = Error::structural("/repo/tsconfig.base.json", "root value is not an object");
    assert_eq!(
        error.to_string(),
        "Unexpected structure in /repo/tsconfig.base.json: root value is not an object"
    );
    assert!(error.help().is_some());
}

#[test]
fn test_io_error_names_operation_and_path() {
    let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error = Error::io(source, "/repo/.env", "writing file");
    assert_eq!(
        error.to_string(),
        "I/O error during writing file at /repo/.env: denied"
    );

    let error: Error = std::io::Error::other("boom").into();
    assert_eq!(error.to_string(), "I/O error during file operation: boom");
}

#[test]
fn test_invalid_target_error() {
    let error = "qa".parse::<monux_core::DeploymentTarget>().unwrap_err();
    assert_eq!(error.to_string(), "Unknown deployment target 'qa'");
    assert!(
        error
            .help()
            .is_some_and(|help| help.to_string().contains("dev, local, stage, prod"))
    );
}

#[test]
fn test_json_error_conversion() {
    let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: Error = source.into();
    assert!(matches!(error, Error::Json { path: None, .. }));
    assert!(error.to_string().starts_with("JSON parsing error: "));
}
