//! Error types for data entry flows

use ha_config_entries::ConfigEntriesError;
use thiserror::Error;

/// User input rejected by a form schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("user input must be an object")]
    NotAnObject,

    #[error("required key not provided: {0}")]
    MissingField(String),

    #[error("extra keys not allowed: {0}")]
    ExtraField(String),

    #[error("expected {expected} for '{field}'")]
    InvalidType {
        field: String,
        expected: &'static str,
    },

    #[error("value '{value}' is not a valid choice for '{field}'")]
    InvalidChoice { field: String, value: String },

    #[error("value {value} for '{field}' must be at least {min}")]
    OutOfRange { field: String, value: i64, min: i64 },
}

/// Errors raised by the flow manager
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("flow not found: {0}")]
    UnknownFlow(String),

    #[error("handler {handler} has no step '{step_id}'")]
    UnknownStep { handler: String, step_id: String },

    #[error("flow cannot be started from source '{0}'")]
    InvalidSource(&'static str),

    #[error("config entry not found: {0}")]
    UnknownEntry(String),

    #[error("user input malformed: {0}")]
    InvalidInput(#[from] SchemaError),

    #[error("config entries error: {0}")]
    ConfigEntries(#[from] ConfigEntriesError),

    #[error("failed to serialize config entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type FlowManagerResult<T> = Result<T, FlowError>;
