//! Error types for the progression engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid stat input for {field}: {reason}")]
    InvalidStatInput { field: String, reason: String },

    #[error("Daily catalog is empty")]
    EmptyCatalog,

    #[error("Invalid criterion '{label}' in '{definition}': {reason}")]
    InvalidCriterionDefinition {
        definition: String,
        label: String,
        reason: String,
    },

    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn stat(field: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidStatInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn criterion(definition: &str, label: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidCriterionDefinition {
            definition: definition.to_string(),
            label: label.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable numeric code, so callers can map errors to their own messages.
    pub fn code(&self) -> i32 {
        match self {
            EngineError::InvalidStatInput { .. } => -41001,
            EngineError::EmptyCatalog => -41002,
            EngineError::InvalidCriterionDefinition { .. } => -41003,
            EngineError::InvalidTable(_) => -41004,
            EngineError::Toml(_) => -41700,
            EngineError::Json(_) => -41701,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
