// crates/wire-format/src/error.rs
//! Error types for bookmark (de)serialization

use pagemark_core::CoreError;
use thiserror::Error;

/// Result type for wire codec operations
pub type WireResult<T> = Result<T, WireError>;

/// Errors that can occur while decoding or encoding bookmarks
#[derive(Debug, Error)]
pub enum WireError {
    /// Malformed JSON text
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A node that must be an object was something else
    #[error("Expected a JSON object for {0}")]
    NotAnObject(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A field was present with the wrong type or an unparsable value
    #[error("Invalid value for field '{field}': {message}")]
    InvalidField { field: String, message: String },

    /// Audiobook locator with a version this codec does not know
    #[error("Unsupported audio book locator version (received {0})")]
    UnsupportedLocatorVersion(i64),

    /// Annotation selector with an unknown type
    #[error("Unrecognized selector node type: {0}")]
    UnsupportedSelector(String),

    /// Decoded values violated a domain constraint
    #[error(transparent)]
    Domain(#[from] CoreError),
}

impl WireError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
