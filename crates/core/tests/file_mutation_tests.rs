//! Integration tests for the file mutation primitives against a real workspace

use monux_core::fs::{create_if_missing, write_if_changed};
use monux_core::json::{add_tsconfig_path, update_json_file};
use monux_core::{Config, DeploymentTarget, Error, FileStatus, Paths, SourceFile};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_if_changed_reports_status() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("apps/admin/environment.ts");

    assert_eq!(write_if_changed(&path, "a\n").unwrap(), FileStatus::Created);
    assert_eq!(write_if_changed(&path, "a\n").unwrap(), FileStatus::Unchanged);
    assert_eq!(write_if_changed(&path, "b\n").unwrap(), FileStatus::Updated);
    assert_eq!(fs::read_to_string(&path).unwrap(), "b\n");
}

#[test]
fn test_create_if_missing_never_overwrites() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".env");
    fs::write(&path, "db_host=localhost\n").unwrap();

    assert_eq!(
        create_if_missing(&path, "").unwrap(),
        FileStatus::Unchanged
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), "db_host=localhost\n");
}

#[test]
fn test_append_lines_is_idempotent_on_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".env");
    fs::write(&path, "db_host=localhost\n").unwrap();

    for _ in 0..2 {
        let mut file = SourceFile::open(&path).unwrap();
        file.append_lines(&["test_port=4201"]);
        file.save().unwrap();
    }
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "db_host=localhost\ntest_port=4201\n"
    );
}

#[test]
fn test_replace_once_leaves_file_untouched_when_ambiguous() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("main.ts");
    fs::write(&path, "a();\na();\n").unwrap();

    let mut file = SourceFile::open(&path).unwrap();
    let err = file.replace_once("a();", "b();").unwrap_err();
    assert!(matches!(err, Error::AmbiguousReplacement { occurrences: 2, .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), "a();\na();\n");
}

#[test]
fn test_tsconfig_alias_merges_paths() {
    let temp = TempDir::new().unwrap();
    let paths = Paths::with_config(temp.path(), Config::default());
    fs::write(
        paths.tsconfig(),
        r#"{"compilerOptions":{"strict":true,"paths":{"@app/ui":["libs/ui/src/index.ts"]}}}"#,
    )
    .unwrap();

    add_tsconfig_path(&paths, "@app/api", &["libs/api/src/index.ts"]).unwrap();
    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(paths.tsconfig()).unwrap()).unwrap();
    assert_eq!(document["compilerOptions"]["strict"], json!(true));
    assert_eq!(
        document["compilerOptions"]["paths"],
        json!({
            "@app/ui": ["libs/ui/src/index.ts"],
            "@app/api": ["libs/api/src/index.ts"],
        })
    );
}

#[test]
fn test_update_json_file_rejects_non_object_root() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("package.json");
    fs::write(&path, "[1, 2]").unwrap();
    let err = update_json_file(&path, json!({ "name": "x" })).unwrap_err();
    assert!(matches!(err, Error::StructuralMismatch { .. }));
}

#[test]
fn test_config_file_overrides_paths() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("monux.toml"), "compose-dir = \"deploy\"\n").unwrap();
    let paths = Paths::from_root(temp.path()).unwrap();
    assert_eq!(
        paths.compose_file(DeploymentTarget::Stage),
        temp.path().join("deploy/stage.docker-compose.yaml")
    );
}

#[test]
fn test_tsconfig_alias_follows_config() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("monux.toml"), "tsconfig = \"tsconfig.json\"\n").unwrap();
    fs::write(temp.path().join("tsconfig.json"), "{}").unwrap();
    let paths = Paths::from_root(temp.path()).unwrap();

    let status = add_tsconfig_path(&paths, "@app/ui", &["libs/ui/src/index.ts"]).unwrap();
    assert_eq!(status, FileStatus::Updated);
    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("tsconfig.json")).unwrap())
            .unwrap();
    assert_eq!(
        document["compilerOptions"]["paths"]["@app/ui"],
        json!(["libs/ui/src/index.ts"])
    );
    assert!(!temp.path().join("tsconfig.base.json").exists());
}
