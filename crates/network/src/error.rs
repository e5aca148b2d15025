// crates/network/src/error.rs
//! Error types for annotation server calls

use crate::problem::ProblemReport;
use pagemark_wire::WireError;
use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur while talking to the annotation server
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Transport-level failure (connect, timeout, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{uri} received {status} {message}")]
    Status {
        uri: String,
        status: u16,
        message: String,
        problem: Option<ProblemReport>,
    },

    /// Response body was not the expected JSON
    #[error("Invalid response body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// Response JSON did not decode into bookmarks
    #[error("Wire format error: {0}")]
    Wire(#[from] WireError),

    /// Custom error
    #[error("{0}")]
    Custom(String),
}

impl NetworkError {
    /// HTTP status of the failed request, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::Status { status, .. } => Some(*status),
            NetworkError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if the error is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(s) if (400..500).contains(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = NetworkError::Status {
            uri: "https://example.com/annotations/".to_string(),
            status: 401,
            message: "Unauthorized".to_string(),
            problem: None,
        };
        assert_eq!(
            err.to_string(),
            "https://example.com/annotations/ received 401 Unauthorized"
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_custom_has_no_status() {
        let err = NetworkError::Custom("boom".to_string());
        assert_eq!(err.status(), None);
        assert!(!err.is_client_error());
    }
}
