//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored rows that do not decode, or an event log that does not chain.
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("migration error: {0}")]
    Migration(String),

    /// No registry metadata has been recorded yet.
    #[error("registry not initialized")]
    NotInitialized,

    /// Registry metadata was already recorded.
    #[error("registry already initialized")]
    AlreadyInitialized,
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
