//! The environment engine: declares, resolves, validates and generates
//! environment variables for one workspace.

use crate::calculation::StaticEnvironment;
use crate::dotenv::{DotEnv, entry_line};
use crate::error::{Error, Result};
use crate::model::{
    CALCULATED_MARKER, EnvironmentModel, SCHEMA_MARKER, SKELETON, STATIC_MARKER, VariableKind,
};
use crate::project::{
    PROJECT_MARKER, read_project_keys, relative_import, render_environment_file,
    render_project_model,
};
use crate::validate::{ValidationError, ValidationReason};
use crate::variable::{CalculatedVariable, EnvValue, StaticVariable, VariableType, is_valid_key};
use monux_core::fs::create_if_missing;
use monux_core::{DeploymentTarget, FileStatus, Paths, SourceFile};
use monux_tsedit::splice::{self, Delimiter};
use monux_tsedit::{OpaqueExpressions, TsCodec, TsValue};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Reads and writes the global environment of a workspace.
#[derive(Debug, Clone)]
pub struct EnvironmentEngine {
    paths: Paths,
    codec: TsCodec,
}

impl EnvironmentEngine {
    /// Create an engine for the workspace described by `paths`.
    #[must_use]
    pub fn new(paths: Paths) -> Self {
        let opaque: OpaqueExpressions = paths
            .config()
            .opaque_expressions
            .iter()
            .map(|(value, source)| (value.clone(), source.clone()))
            .collect();
        Self {
            codec: TsCodec::new(opaque),
            paths,
        }
    }

    /// Workspace paths.
    #[must_use]
    pub const fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Codec used for every TypeScript literal.
    #[must_use]
    pub const fn codec(&self) -> &TsCodec {
        &self.codec
    }

    /// Create the global model and `.env` if they do not exist.
    ///
    /// A new `.env` starts as a copy of `.env.public`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or written.
    pub fn init(&self) -> Result<Vec<(PathBuf, FileStatus)>> {
        let model_path = self.paths.global_environment_model();
        let model = create_if_missing(&model_path, SKELETON)?;

        let env_path = self.paths.env_file();
        let public = SourceFile::open_or_default(self.paths.public_env_file())?;
        let env = create_if_missing(&env_path, &public.content())?;

        Ok(vec![(model_path, model), (env_path, env)])
    }

    /// Declare a static variable and store its value.
    ///
    /// The value goes to `.env`; `.env.public` receives the value when
    /// `is_public` and an empty placeholder otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`], [`Error::DuplicateKey`] or
    /// [`Error::InvalidValue`] before any file is written, or an error if a
    /// file cannot be edited.
    pub fn add_static_variable(&self, variable: &StaticVariable, is_public: bool) -> Result<()> {
        let key = variable.key.as_str();
        check_key(key)?;

        let mut model = self.open_model()?;
        let mut env = SourceFile::open_or_default(self.paths.env_file())?;
        let mut public = SourceFile::open_or_default(self.paths.public_env_file())?;
        self.check_unique(key, &model, &[&env, &public])?;

        let raw = variable.value.as_ref().map(ToString::to_string);
        if let (Some(value), Some(raw)) = (&variable.value, &raw)
            && (value.variable_type() != variable.var_type || raw.contains('\n'))
        {
            return Err(Error::InvalidValue {
                key: key.to_string(),
                value: raw.clone(),
                expected: variable.var_type.as_str(),
            });
        }

        splice::append_to_literal(
            &mut model,
            STATIC_MARKER,
            &[variable.declaration().render()],
            Delimiter::Semicolon,
        )?;
        env.append_lines(&[entry_line(key, raw.as_deref())]);
        public.append_lines(&[entry_line(key, raw.as_deref().filter(|_| is_public))]);

        model.save()?;
        env.save()?;
        public.save()?;
        info!(key, public = is_public, "Added static variable");
        Ok(())
    }

    /// Declare a calculated variable and store its calculation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`], [`Error::IncompleteCalculation`],
    /// [`Error::UnresolvedReference`] or [`Error::CalculationType`] before the
    /// model is written.
    pub fn add_calculated_variable(&self, variable: &CalculatedVariable) -> Result<()> {
        let key = variable.key.as_str();
        check_key(key)?;

        let mut model_file = self.open_model()?;
        let env = SourceFile::open_or_default(self.paths.env_file())?;
        let model = self.check_unique(key, &model_file, &[&env])?;

        let missing = variable.value.missing_targets();
        if !missing.is_empty() {
            return Err(Error::IncompleteCalculation {
                key: key.to_string(),
                missing,
            });
        }
        if let Some(reference) = variable
            .value
            .references()
            .find(|r| !model.statics.iter().any(|d| d.key == *r))
        {
            return Err(Error::UnresolvedReference {
                key: key.to_string(),
                reference: reference.to_string(),
            });
        }
        let declared = |key: &str| {
            model
                .statics
                .iter()
                .find(|d| d.key == key)
                .map(|d| d.var_type)
        };
        if let Some(found) = variable
            .value
            .exprs()
            .filter_map(|expr| expr.static_type(declared))
            .find(|found| *found != variable.var_type)
        {
            return Err(Error::CalculationType {
                key: key.to_string(),
                expected: variable.var_type.as_str(),
                found: found.as_str(),
            });
        }

        splice::append_to_literal(
            &mut model_file,
            CALCULATED_MARKER,
            &[variable.declaration().render()],
            Delimiter::Semicolon,
        )?;
        let indent = schema_indent(&model_file) + monux_tsedit::codec::INDENT;
        splice::append_to_literal(
            &mut model_file,
            SCHEMA_MARKER,
            &[format!("{key}: {}", variable.value.render(indent))],
            Delimiter::Comma,
        )?;
        model_file.save()?;
        info!(key, "Added calculated variable");
        Ok(())
    }

    /// Value of `key` for `target`.
    ///
    /// Returns `None` for a declared variable without a value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an undeclared key,
    /// [`Error::InvalidValue`] if a static value does not match its type,
    /// [`Error::MissingValue`] if a calculation has no branch for `target`,
    /// and [`Error::UnresolvedReference`] if it reads an undeclared key.
    pub fn get_env_variable(&self, key: &str, target: DeploymentTarget) -> Result<Option<EnvValue>> {
        let model = self.read_model()?;
        let env = self.read_env()?;
        resolve(&model, &env, key, target)
    }

    /// Check every declared variable, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns an error only if the model itself cannot be read.
    pub fn validate(&self) -> Result<Vec<ValidationError>> {
        let env_path = self.paths.env_file();
        if !env_path.exists() {
            return Ok(vec![ValidationError::for_file(
                ValidationReason::FileDoesNotExist,
                format!("{} does not exist", env_path.display()),
            )]);
        }
        let model = self.read_model()?;
        let env = self.read_env()?;
        let mut errors = Vec::new();

        for declaration in &model.statics {
            let key = declaration.key.as_str();
            match env.get(key) {
                None if declaration.required => errors.push(ValidationError::for_key(
                    key,
                    ValidationReason::Required,
                    "required variable has no value",
                )),
                None => {}
                Some(raw) => {
                    let reason = match declaration.var_type {
                        VariableType::String => continue,
                        VariableType::Number => ValidationReason::Number,
                        VariableType::Boolean => ValidationReason::Boolean,
                    };
                    if declaration.var_type.coerce(key, raw).is_err() {
                        errors.push(ValidationError::for_key(
                            key,
                            reason,
                            format!("'{raw}' is not a valid {}", declaration.var_type),
                        ));
                    }
                }
            }
        }

        let snapshot = static_snapshot(&model, &env);
        for declaration in &model.calculated {
            let key = declaration.key.as_str();
            let calculation = match model.calculation(key) {
                Ok(calculation) => calculation,
                Err(err) => {
                    errors.push(ValidationError::for_key(
                        key,
                        ValidationReason::Calculation,
                        err.to_string(),
                    ));
                    continue;
                }
            };
            for target in DeploymentTarget::ALL {
                let message = match calculation.expr_for(target).map(|e| e.evaluate(&snapshot)) {
                    None => format!("no value for target '{target}'"),
                    Some(Err(reference)) => {
                        format!("references undeclared static variable '{reference}'")
                    }
                    Some(Ok(Some(value))) if value.variable_type() != declaration.var_type => {
                        format!(
                            "returns {} '{value}' for target '{target}', expected {}",
                            value.variable_type(),
                            declaration.var_type
                        )
                    }
                    Some(Ok(_)) => continue,
                };
                errors.push(ValidationError::for_key(
                    key,
                    ValidationReason::Calculation,
                    message,
                ));
            }
        }

        debug!(errors = errors.len(), "Validated environment");
        Ok(errors)
    }

    /// Declare the keys a project uses.
    ///
    /// Creates the project's model file or appends keys it does not list yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if a key is not declared globally.
    pub fn setup_project_environment(&self, project: &Path, keys: &[&str]) -> Result<FileStatus> {
        let model = self.read_model()?;
        if let Some(key) = keys.iter().find(|key| !model.contains(key)) {
            return Err(Error::not_found(*key));
        }

        let path = self.paths.project_environment_model(project);
        if !path.exists() {
            let from_dir = path.parent().unwrap_or(Path::new("."));
            let import = relative_import(from_dir, &self.paths.global_environment_model());
            let content = render_project_model(&import, keys, &self.codec)?;
            return Ok(monux_core::fs::write_if_changed(&path, &content)?);
        }

        let mut file = SourceFile::open(&path)?;
        let items: Vec<TsValue> = keys.iter().map(|key| TsValue::from(*key)).collect();
        splice::add_array_items(&mut file, PROJECT_MARKER, &items, &self.codec)?;
        Ok(file.save()?)
    }

    /// Keys listed in a project's model file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or has no key list.
    pub fn project_keys(&self, project: &Path) -> Result<Vec<String>> {
        let file = SourceFile::open(self.paths.project_environment_model(project))?;
        read_project_keys(&file, &self.codec)
    }

    /// Write a project's `environment.ts` for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the project lists an undeclared key,
    /// plus the errors of [`Self::get_env_variable`].
    pub fn build_environment_file_for_app(
        &self,
        project: &Path,
        target: DeploymentTarget,
    ) -> Result<FileStatus> {
        let model = self.read_model()?;
        let env = self.read_env()?;
        let values = self
            .project_keys(project)?
            .into_iter()
            .map(|key| {
                let value = resolve(&model, &env, &key, target)?;
                Ok((key, value.as_ref().map_or(TsValue::Undefined, TsValue::from)))
            })
            .collect::<Result<Vec<_>>>()?;

        let content = render_environment_file(target, values, &self.codec)?;
        Ok(monux_core::fs::write_if_changed(
            &self.paths.project_environment_file(project),
            &content,
        )?)
    }

    /// Rebuild `environment.ts` of every project that has a model file.
    ///
    /// # Errors
    ///
    /// Stops at the first project that cannot be built.
    pub fn build_environment_files(
        &self,
        target: DeploymentTarget,
    ) -> Result<Vec<(PathBuf, FileStatus)>> {
        let mut results = Vec::new();
        for project in self.projects() {
            let status = self.build_environment_file_for_app(&project, target)?;
            results.push((self.paths.project_environment_file(&project), status));
        }
        Ok(results)
    }

    /// Projects under the configured project directories that have a model file.
    pub fn projects(&self) -> Vec<PathBuf> {
        let mut projects: Vec<PathBuf> = self
            .paths
            .project_dirs()
            .flat_map(|dir| {
                WalkDir::new(dir)
                    .min_depth(1)
                    .max_depth(1)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_dir())
                    .map(walkdir::DirEntry::into_path)
            })
            .filter(|dir| self.paths.project_environment_model(dir).exists())
            .map(|dir| {
                dir.strip_prefix(self.paths.root())
                    .map_or_else(|_| dir.clone(), Path::to_path_buf)
            })
            .collect();
        projects.sort();
        debug!(count = projects.len(), "Discovered projects");
        projects
    }

    /// Read the global model.
    ///
    /// # Errors
    ///
    /// Returns an error if the model file is missing or malformed.
    pub fn read_model(&self) -> Result<EnvironmentModel> {
        let file = SourceFile::open(self.paths.global_environment_model())?;
        EnvironmentModel::read(&file, &self.codec)
    }

    fn read_env(&self) -> Result<DotEnv> {
        let file = SourceFile::open_or_default(self.paths.env_file())?;
        Ok(DotEnv::from_file(&file))
    }

    fn open_model(&self) -> Result<SourceFile> {
        let mut file = SourceFile::open_or_default(self.paths.global_environment_model())?;
        if file.lines().is_empty() {
            file.set_content(SKELETON);
        }
        Ok(file)
    }

    /// Reject `key` if the model or any env file already has it.
    fn check_unique(
        &self,
        key: &str,
        model_file: &SourceFile,
        env_files: &[&SourceFile],
    ) -> Result<EnvironmentModel> {
        let duplicate = |location: &Path| Error::DuplicateKey {
            key: key.to_string(),
            location: location.display().to_string(),
        };
        let model = EnvironmentModel::read(model_file, &self.codec)?;
        if model.contains(key) {
            return Err(duplicate(model_file.path()));
        }
        if let Some(file) = env_files.iter().find(|f| DotEnv::from_file(f).contains(key)) {
            return Err(duplicate(file.path()));
        }
        Ok(model)
    }
}

fn check_key(key: &str) -> Result<()> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(Error::InvalidKey {
            key: key.to_string(),
        })
    }
}

fn schema_indent(file: &SourceFile) -> usize {
    file.lines()
        .iter()
        .find(|line| line.contains(SCHEMA_MARKER))
        .map_or(0, |line| line.len() - line.trim_start().len())
}

/// Static variables as seen by calculations; values that do not match
/// their declared type are left out.
fn static_snapshot(model: &EnvironmentModel, env: &DotEnv) -> StaticEnvironment {
    let mut snapshot = StaticEnvironment::new();
    for declaration in &model.statics {
        let value = env
            .get(&declaration.key)
            .and_then(|raw| declaration.var_type.coerce(&declaration.key, raw).ok());
        snapshot.insert(declaration.key.clone(), value);
    }
    snapshot
}

fn resolve(
    model: &EnvironmentModel,
    env: &DotEnv,
    key: &str,
    target: DeploymentTarget,
) -> Result<Option<EnvValue>> {
    let (kind, declaration) = model.declaration(key).ok_or_else(|| Error::not_found(key))?;
    match kind {
        VariableKind::Static => env
            .get(key)
            .map(|raw| declaration.var_type.coerce(key, raw))
            .transpose(),
        VariableKind::Calculated => {
            let calculation = model.calculation(key)?;
            let expr = calculation
                .expr_for(target)
                .ok_or_else(|| Error::MissingValue {
                    key: key.to_string(),
                    target,
                })?;
            expr.evaluate(&static_snapshot(model, env))
                .map_err(|reference| Error::UnresolvedReference {
                    key: key.to_string(),
                    reference: reference.to_string(),
                })
        }
    }
}
