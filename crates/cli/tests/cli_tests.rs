//! End-to-end tests for the monux binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn monux(root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("monux").unwrap();
    cmd.env_remove("RUST_LOG").env("MONUX_ROOT", root.path());
    cmd
}

#[test]
fn test_version() {
    let temp = TempDir::new().unwrap();
    monux(&temp)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("monux "));
}

#[test]
fn test_env_static_round_trip() {
    let temp = TempDir::new().unwrap();
    monux(&temp).args(["env", "init"]).assert().success();
    monux(&temp)
        .args(["env", "add-static", "test_port", "4201", "--type", "number"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added test_port"));

    monux(&temp)
        .args(["env", "get", "test_port", "--target", "dev.docker-compose.yaml"])
        .assert()
        .success()
        .stdout("4201\n");

    let env = fs::read_to_string(temp.path().join(".env")).unwrap();
    assert!(env.contains("test_port=4201"));
}

#[test]
fn test_duplicate_key_fails_with_edit_exit_code() {
    let temp = TempDir::new().unwrap();
    monux(&temp)
        .args(["env", "add-static", "db_host", "localhost"])
        .assert()
        .success();
    monux(&temp)
        .args(["env", "add-static", "db_host", "other"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("db_host"));
}

#[test]
fn test_validate_missing_env_file_json() {
    let temp = TempDir::new().unwrap();
    monux(&temp)
        .args(["--json", "env", "validate"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FILE_DOES_NOT_EXIST"))
        .stdout(predicate::str::contains(r#""status":"invalid""#));
}

#[test]
fn test_unknown_target_is_usage_error() {
    let temp = TempDir::new().unwrap();
    monux(&temp)
        .args(["env", "get", "test_port", "--target", "qa"])
        .assert()
        .code(2);
}

#[test]
fn test_compose_add_service_and_list_databases() {
    let temp = TempDir::new().unwrap();
    monux(&temp)
        .args([
            "compose",
            "add-service",
            "db",
            "--image",
            "postgres:16",
            "--target",
            "prod",
        ])
        .assert()
        .success()
        .stdout("Created docker-compose.yaml\n");

    monux(&temp)
        .args(["--json", "compose", "databases"])
        .assert()
        .success()
        .stdout("{\"status\":\"ok\",\"data\":[\"db\"]}\n");
}

#[test]
fn test_reserved_sub_domain_rejected() {
    let temp = TempDir::new().unwrap();
    monux(&temp)
        .args([
            "compose", "labels", "site", "--port", "80", "--target", "prod", "--sub-domain", "www",
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("www"));
}

#[test]
fn test_log_format_flag() {
    let temp = TempDir::new().unwrap();
    monux(&temp)
        .args(["--log-format", "pretty", "--level", "debug", "version"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("monux "))
        .stderr(predicate::str::contains("Tracing initialized"));
}
