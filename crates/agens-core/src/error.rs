//! Centralized error types for the AgensGraph client.

use thiserror::Error;

/// Main error type for command building and value decoding.
#[derive(Error, Debug)]
pub enum AgensError {
    #[error("Invalid graph id: '{0}'")]
    InvalidGraphId(String),

    #[error("Bad vertex representation: {0}")]
    InvalidVertex(String),

    #[error("Bad edge representation: {0}")]
    InvalidEdge(String),

    #[error("Bad graphpath representation: {0}")]
    InvalidPath(String),

    #[error("Failed to decode column '{column}': {message}")]
    Decode { column: String, message: String },

    #[error("Unexpected NULL in column '{0}'")]
    UnexpectedNull(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for core operations.
pub type AgensResult<T> = Result<T, AgensError>;

impl AgensError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a decode error for a column.
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }
}
