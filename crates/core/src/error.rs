//! Error types for the bookmark domain model

use thiserror::Error;

/// Result type for domain model operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while constructing or validating domain values
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// A locator violated one of its range constraints
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// A bookmark violated one of its range constraints
    #[error("Invalid bookmark: {0}")]
    InvalidBookmark(String),

    /// A motivation URI or kind name was not recognized
    #[error("Unrecognized bookmark kind: {0}")]
    UnrecognizedKind(String),

    /// A timestamp could not be parsed
    #[error("Invalid timestamp '{0}'")]
    InvalidTime(String),

    /// Custom error
    #[error("{0}")]
    Custom(String),
}
