//! Partial updates of JSON configuration files (`tsconfig.base.json`,
//! `angular.json`, `package.json`).
//!
//! Objects are merged key by key. Arrays are never merged element-wise: an
//! array in the patch replaces the target array wholesale, as does any scalar.

use crate::fs::{FileStatus, write_if_changed};
use crate::{Error, Paths, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// Merge `patch` into `target`.
///
/// - object + object: recurse per key, keeping keys absent from the patch
/// - anything else: the patch value replaces the target value
pub fn deep_merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match target_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, patch_value),
                    None => {
                        target_map.insert(key, patch_value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

/// Apply `patch` to the JSON object stored at `path`.
///
/// # Errors
///
/// Returns an error if the file is missing, is not valid JSON, has a
/// non-object root, or cannot be written.
pub fn update_json_file(path: &Path, patch: Value) -> Result<FileStatus> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content =
        std::fs::read_to_string(path).map_err(|e| Error::io(e, path, "reading JSON file"))?;
    let mut document: Value = serde_json::from_str(&content).map_err(|source| Error::Json {
        source,
        path: Some(path.to_path_buf()),
    })?;
    if !document.is_object() {
        return Err(Error::structural(path, "root value is not an object"));
    }

    deep_merge(&mut document, patch);

    let mut rendered = serde_json::to_string_pretty(&document)?;
    rendered.push('\n');
    write_if_changed(path, &rendered)
}

/// Register a TypeScript path alias (`@workspace/ui` -> `libs/ui/src/index.ts`)
/// in the workspace's configured tsconfig.
///
/// # Errors
///
/// Returns an error if the tsconfig cannot be read, parsed or written.
pub fn add_tsconfig_path(paths: &Paths, alias: &str, targets: &[&str]) -> Result<FileStatus> {
    let tsconfig = paths.tsconfig();
    let mut aliases = Map::new();
    aliases.insert(
        alias.to_string(),
        Value::Array(targets.iter().map(|t| Value::String((*t).to_string())).collect()),
    );
    let patch = serde_json::json!({ "compilerOptions": { "paths": aliases } });
    tracing::debug!(alias, tsconfig = %tsconfig.display(), "Adding tsconfig path alias");
    update_json_file(&tsconfig, patch)
}
