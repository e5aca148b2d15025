// crates/sync-engine/src/error.rs
//! Error types for bookmark synchronization

use pagemark_core::{AccountId, BookId, CoreError};
use pagemark_network::NetworkError;
use thiserror::Error;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during synchronization
#[derive(Debug, Error)]
pub enum SyncError {
    /// A call to the annotation server failed
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// A bookmark or locator violated a domain invariant
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Local book storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// No profile is selected
    #[error("No profile is current")]
    NoCurrentProfile,

    /// The current profile has no such account
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The book has no storage handle in any known format
    #[error("No format handle for book {0}")]
    NoFormatHandle(BookId),

    /// The worker thread is gone; the task never ran
    #[error("Bookmark worker has stopped")]
    WorkerStopped,

    /// Custom error
    #[error("{0}")]
    Custom(String),
}

impl SyncError {
    pub(crate) fn lock_poisoned() -> Self {
        SyncError::Custom("Lock poisoned".to_string())
    }
}
