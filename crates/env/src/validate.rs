//! Validation results for the static and calculated environment.

use serde::Serialize;
use std::fmt;

/// Why a variable failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationReason {
    /// A required variable has no value.
    Required,
    /// The value is not a number.
    Number,
    /// The value is not `true` or `false`.
    Boolean,
    /// The `.env` file is missing.
    FileDoesNotExist,
    /// A calculated variable cannot be resolved for some target.
    Calculation,
}

impl ValidationReason {
    /// Upper-case name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Required => "REQUIRED",
            Self::Number => "NUMBER",
            Self::Boolean => "BOOLEAN",
            Self::FileDoesNotExist => "FILE_DOES_NOT_EXIST",
            Self::Calculation => "CALCULATION",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Offending key; `None` for file-level failures.
    pub key: Option<String>,
    /// Failure class.
    pub reason: ValidationReason,
    /// Human-readable detail.
    pub message: String,
}

impl ValidationError {
    pub(crate) fn for_key(
        key: &str,
        reason: ValidationReason,
        message: impl Into<String>,
    ) -> Self {
        Self {
            key: Some(key.to_string()),
            reason,
            message: message.into(),
        }
    }

    pub(crate) fn for_file(reason: ValidationReason, message: impl Into<String>) -> Self {
        Self {
            key: None,
            reason,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{} {key}: {}", self.reason, self.message),
            None => write!(f, "{}: {}", self.reason, self.message),
        }
    }
}
