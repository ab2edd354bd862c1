//! Storage error types.

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Connecting to, or selecting the namespace/database on, the backend
    /// failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// An operation did not finish within its time budget.
    #[error("timed out after {after_ms} ms: {operation}")]
    Timeout {
        /// What was being attempted.
        operation: String,
        /// The budget that was exceeded.
        after_ms: u128,
    },

    /// A statement was rejected or failed inside the backend.
    #[error("query error: {0}")]
    Query(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The database handle has been closed.
    #[error("database connection is closed")]
    Closed,
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        Self::Query(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
