//! Per-project environment files.
//!
//! A project's model file lists the global keys it uses inside a
//! `defineVariables([...])` call; its generated `environment.ts` holds the
//! resolved value of each of those keys for one target.

use crate::error::Result;
use monux_core::{DeploymentTarget, SourceFile};
use monux_tsedit::{TsCodec, TsValue, find_bracketed_region};
use std::path::{Component, Path};

/// Marker of the key list in a project model file.
pub const PROJECT_MARKER: &str = "defineVariables(";

/// Content of a new project model file.
///
/// # Errors
///
/// Returns an error if a key cannot be encoded.
pub fn render_project_model(import_path: &str, keys: &[&str], codec: &TsCodec) -> Result<String> {
    let keys = TsValue::Array(keys.iter().map(|key| TsValue::from(*key)).collect());
    Ok(format!(
        "import {{ defineVariables }} from '{import_path}';\n\
         \n\
         // Keys of the global environment used by this project.\n\
         export const environmentVariables = defineVariables({});\n",
        codec.stringify(&keys, 0)?
    ))
}

/// Keys listed in a project model file.
///
/// # Errors
///
/// Returns an error if the `defineVariables(` call cannot be located.
pub fn read_project_keys(file: &SourceFile, codec: &TsCodec) -> Result<Vec<String>> {
    let segment = find_bracketed_region(file.lines(), PROJECT_MARKER)
        .map_err(|e| e.in_file(file.path()))?;
    let keys = match codec.parse(&segment.content) {
        TsValue::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                TsValue::String(key) => Some(key),
                other => {
                    tracing::warn!(item = ?other, path = %file.path().display(), "Ignoring non-string project variable");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(keys)
}

/// Content of a generated `environment.ts`.
///
/// # Errors
///
/// Returns an error if a value cannot be encoded.
pub fn render_environment_file(
    target: DeploymentTarget,
    values: Vec<(String, TsValue)>,
    codec: &TsCodec,
) -> Result<String> {
    Ok(format!(
        "// Generated by monux for the '{target}' target. Run `monux env build` to regenerate.\n\
         export const environment = {};\n",
        codec.stringify(&TsValue::Object(values), 0)?
    ))
}

/// Module specifier importing `module` (a `.ts` file) from a file in `from_dir`.
#[must_use]
pub fn relative_import(from_dir: &Path, module: &Path) -> String {
    let module = module.with_extension("");
    let from: Vec<Component<'_>> = from_dir.components().collect();
    let to: Vec<Component<'_>> = module.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    let joined = parts.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{joined}")
    }
}
