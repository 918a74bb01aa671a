//! The global environment model file.
//!
//! The model is generated TypeScript that doubles as the engine's database:
//! two type blocks declare static and calculated variables and the
//! `calculationSchemaFor` object holds one function per calculated variable.
//! Blocks are found by their header markers, so the headers must not be
//! renamed.

use crate::calculation::Calculation;
use crate::error::{Error, Result};
use crate::variable::{Declaration, VariableType};
use monux_core::SourceFile;
use monux_tsedit::{TsCodec, TsValue, find_bracketed_region, scan};

/// Header of the static variable type block.
pub const STATIC_MARKER: &str = "StaticGlobalEnvironment = {";
/// Header of the calculated variable type block.
pub const CALCULATED_MARKER: &str = "CalculatedGlobalEnvironment = {";
/// Header of the calculation functions object.
pub const SCHEMA_MARKER: &str = "calculationSchemaFor: CalculationSchema = {";

/// Content of a freshly initialized model file.
pub const SKELETON: &str = "\
// Generated by monux.
// DON'T RENAME the blocks below: monux finds them by their headers.

export type StaticGlobalEnvironment = {
};

export type CalculatedGlobalEnvironment = {
};

export type GlobalEnvironment = StaticGlobalEnvironment & CalculatedGlobalEnvironment;

export type DeploymentTarget = 'dev' | 'local' | 'stage' | 'prod';

export type CalculationSchema = {
    [K in keyof CalculatedGlobalEnvironment]: (
        env: StaticGlobalEnvironment,
        target: DeploymentTarget
    ) => CalculatedGlobalEnvironment[K];
};

export const calculationSchemaFor: CalculationSchema = {
};

export function defineVariables<K extends keyof GlobalEnvironment>(keys: K[]): K[] {
    return keys;
}
";

/// Where a declared variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Value stored in `.env`.
    Static,
    /// Value computed per target.
    Calculated,
}

/// Declarations and calculation sources read from the model file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentModel {
    /// Static declarations in block order.
    pub statics: Vec<Declaration>,
    /// Calculated declarations in block order.
    pub calculated: Vec<Declaration>,
    /// Function source per calculated key.
    pub calculations: Vec<(String, String)>,
}

impl EnvironmentModel {
    /// Read the model from its file.
    ///
    /// # Errors
    ///
    /// Returns an error if a marker is missing or a declaration is malformed.
    pub fn read(file: &SourceFile, codec: &TsCodec) -> Result<Self> {
        let lines = file.lines();
        let locate = |marker| {
            find_bracketed_region(lines, marker).map_err(|e| Error::from(e.in_file(file.path())))
        };

        let statics = parse_type_block(locate(STATIC_MARKER)?.inner(), "StaticGlobalEnvironment")?;
        let calculated =
            parse_type_block(locate(CALCULATED_MARKER)?.inner(), "CalculatedGlobalEnvironment")?;

        let schema = locate(SCHEMA_MARKER)?;
        let calculations = match codec.parse(&schema.content) {
            TsValue::Object(entries) => entries
                .into_iter()
                .map(|(key, value)| -> Result<(String, String)> {
                    let source = match value {
                        TsValue::Expression(source) => source,
                        other => codec.stringify(&other, 0)?,
                    };
                    Ok((key, source))
                })
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        tracing::debug!(
            statics = statics.len(),
            calculated = calculated.len(),
            "Read global environment model"
        );
        Ok(Self {
            statics,
            calculated,
            calculations,
        })
    }

    /// Find a declaration by key.
    #[must_use]
    pub fn declaration(&self, key: &str) -> Option<(VariableKind, &Declaration)> {
        if let Some(declaration) = self.statics.iter().find(|d| d.key == key) {
            return Some((VariableKind::Static, declaration));
        }
        self.calculated
            .iter()
            .find(|d| d.key == key)
            .map(|declaration| (VariableKind::Calculated, declaration))
    }

    /// Whether `key` is declared in either block.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.declaration(key).is_some()
    }

    /// Parsed calculation of a calculated variable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCalculation`] if the schema has no entry for
    /// the key or its function cannot be read.
    pub fn calculation(&self, key: &str) -> Result<Calculation> {
        let (_, source) = self
            .calculations
            .iter()
            .find(|(k, _)| k == key)
            .ok_or_else(|| Error::invalid_calculation(key, "no entry in calculationSchemaFor"))?;
        Calculation::parse(source).map_err(|message| Error::invalid_calculation(key, message))
    }
}

/// Parse the members of a type block (`key: type;` or `key?: type,`).
fn parse_type_block(inner: &str, block: &'static str) -> Result<Vec<Declaration>> {
    scan::split_top_level(inner, ';')
        .into_iter()
        .flat_map(|member| scan::split_top_level(member, ','))
        .map(scan::trim_code)
        .filter(|member| !member.is_empty())
        .map(|member| {
            let invalid = || Error::InvalidDeclaration {
                declaration: member.to_string(),
                block,
            };
            let (key, var_type) = scan::split_key_value(member).ok_or_else(invalid)?;
            let key = key.trim();
            let (key, required) = match key.strip_suffix('?') {
                Some(key) => (key.trim_end(), false),
                None => (key, true),
            };
            let var_type = var_type.parse::<VariableType>().map_err(|_| invalid())?;
            Ok(Declaration {
                key: key.to_string(),
                required,
                var_type,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "\
export type StaticGlobalEnvironment = {
    test_port: number;
    // set per machine
    test_sub_domain?: string;
    debug: boolean
};

export type CalculatedGlobalEnvironment = {
    test_base_url: string;
};

export const calculationSchemaFor: CalculationSchema = {
    test_base_url: (env, target) => {
        switch (target) {
            case 'dev':
                return `http://localhost:${env.test_port}`;
            default:
                return 'https://example.com';
        }
    }
};
";

    fn model(content: &str) -> Result<EnvironmentModel> {
        EnvironmentModel::read(
            &SourceFile::from_content("environment.global-model.ts", content),
            &TsCodec::default(),
        )
    }

    #[test]
    fn test_read_declarations() {
        let model = model(MODEL).unwrap();
        let keys: Vec<_> = model.statics.iter().map(|d| d.render()).collect();
        assert_eq!(
            keys,
            ["test_port: number", "test_sub_domain?: string", "debug: boolean"]
        );
        assert_eq!(model.calculated.len(), 1);
        assert!(model.contains("test_base_url"));
        assert_eq!(
            model.declaration("test_port").map(|(kind, _)| kind),
            Some(VariableKind::Static)
        );
        assert_eq!(
            model.declaration("test_base_url").map(|(kind, _)| kind),
            Some(VariableKind::Calculated)
        );
    }

    #[test]
    fn test_read_calculation() {
        let model = model(MODEL).unwrap();
        let calculation = model.calculation("test_base_url").unwrap();
        assert!(calculation.missing_targets().is_empty());
        let err = model.calculation("other").unwrap_err();
        assert!(matches!(err, Error::InvalidCalculation { .. }));
    }

    #[test]
    fn test_skeleton_is_empty_model() {
        let model = model(SKELETON).unwrap();
        assert_eq!(model, EnvironmentModel::default());
    }

    #[test]
    fn test_missing_marker() {
        let err = model("export type StaticGlobalEnvironment = {\n};\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Tsedit(monux_tsedit::Error::MarkerNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_declaration() {
        let content = SKELETON.replace(
            "StaticGlobalEnvironment = {\n",
            "StaticGlobalEnvironment = {\n    port: Date;\n",
        );
        let err = model(&content).unwrap_err();
        assert!(matches!(err, Error::InvalidDeclaration { .. }));
    }
}
