//! Environment variable declarations and values.

use crate::calculation::Calculation;
use crate::error::{Error, Result};
use monux_tsedit::TsValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared TypeScript type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    /// `string`
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
}

impl VariableType {
    /// TypeScript spelling of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    /// Convert a raw `.env` value to this type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if the text is not a number or boolean
    /// as required.
    pub fn coerce(self, key: &str, raw: &str) -> Result<EnvValue> {
        let invalid = || Error::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            expected: self.as_str(),
        };
        match self {
            Self::String => Ok(EnvValue::String(raw.to_string())),
            Self::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(EnvValue::Number)
                .ok_or_else(invalid),
            Self::Boolean => match raw.trim() {
                "true" => Ok(EnvValue::Boolean(true)),
                "false" => Ok(EnvValue::Boolean(false)),
                _ => Err(invalid()),
            },
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            other => Err(format!("unsupported variable type '{other}'")),
        }
    }
}

/// A resolved variable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnvValue {
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
}

impl EnvValue {
    /// Type of this value.
    #[must_use]
    pub const fn variable_type(&self) -> VariableType {
        match self {
            Self::String(_) => VariableType::String,
            Self::Number(_) => VariableType::Number,
            Self::Boolean(_) => VariableType::Boolean,
        }
    }
}

impl fmt::Display for EnvValue {
    /// Formats the value as it is written to `.env` and interpolated into
    /// template literals.
    #[allow(clippy::cast_possible_truncation)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&EnvValue> for TsValue {
    fn from(value: &EnvValue) -> Self {
        match value {
            EnvValue::String(s) => Self::String(s.clone()),
            EnvValue::Number(n) => Self::Number(*n),
            EnvValue::Boolean(b) => Self::Boolean(*b),
        }
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<f64> for EnvValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for EnvValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// A key with its declared type, as listed in a type block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    /// Variable key.
    pub key: String,
    /// Whether the variable must have a value.
    pub required: bool,
    /// Declared type.
    #[serde(rename = "type")]
    pub var_type: VariableType,
}

impl Declaration {
    /// Render as a type block member (`key?: type`).
    #[must_use]
    pub fn render(&self) -> String {
        let optional = if self.required { "" } else { "?" };
        format!("{}{optional}: {}", self.key, self.var_type)
    }
}

/// A variable whose value is stored in `.env`.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticVariable {
    /// Variable key.
    pub key: String,
    /// Value to store; `None` leaves an empty entry.
    pub value: Option<EnvValue>,
    /// Whether the variable must have a value.
    pub required: bool,
    /// Declared type.
    pub var_type: VariableType,
}

impl StaticVariable {
    /// A required variable whose type follows its value.
    pub fn new(key: impl Into<String>, value: impl Into<EnvValue>) -> Self {
        let value = value.into();
        Self {
            key: key.into(),
            var_type: value.variable_type(),
            value: Some(value),
            required: true,
        }
    }

    /// Mark the variable as optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub(crate) fn declaration(&self) -> Declaration {
        Declaration {
            key: self.key.clone(),
            required: self.required,
            var_type: self.var_type,
        }
    }
}

/// A variable derived per deployment target from static variables.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatedVariable {
    /// Variable key.
    pub key: String,
    /// Whether the variable must have a value.
    pub required: bool,
    /// Declared type.
    pub var_type: VariableType,
    /// Per-target value definition.
    pub value: Calculation,
}

impl CalculatedVariable {
    /// A required calculated variable.
    pub fn new(key: impl Into<String>, var_type: VariableType, value: Calculation) -> Self {
        Self {
            key: key.into(),
            required: true,
            var_type,
            value,
        }
    }

    pub(crate) fn declaration(&self) -> Declaration {
        Declaration {
            key: self.key.clone(),
            required: self.required,
            var_type: self.var_type,
        }
    }
}

/// Whether `key` is a valid variable key (snake_case).
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_number() {
        assert_eq!(
            VariableType::Number.coerce("port", "4201").unwrap(),
            EnvValue::Number(4201.0)
        );
        let err = VariableType::Number.coerce("port", "abc").unwrap_err();
        assert!(matches!(err, Error::InvalidValue { expected: "number", .. }));
        assert!(VariableType::Number.coerce("port", "NaN").is_err());
    }

    #[test]
    fn test_coerce_boolean() {
        assert_eq!(
            VariableType::Boolean.coerce("debug", "true").unwrap(),
            EnvValue::Boolean(true)
        );
        assert!(VariableType::Boolean.coerce("debug", "yes").is_err());
    }

    #[test]
    fn test_display_integral_number() {
        assert_eq!(EnvValue::Number(4201.0).to_string(), "4201");
        assert_eq!(EnvValue::Number(0.5).to_string(), "0.5");
    }

    #[test]
    fn test_declaration_render() {
        let required = StaticVariable::new("test_port", 4201.0).declaration();
        assert_eq!(required.render(), "test_port: number");
        let optional = StaticVariable::new("debug", true).optional().declaration();
        assert_eq!(optional.render(), "debug?: boolean");
    }

    #[test]
    fn test_valid_keys() {
        assert!(is_valid_key("prod_root_domain"));
        assert!(is_valid_key("db2_port"));
        assert!(!is_valid_key("PROD_ROOT"));
        assert!(!is_valid_key("2fa"));
        assert!(!is_valid_key("api-url"));
        assert!(!is_valid_key(""));
    }
}
