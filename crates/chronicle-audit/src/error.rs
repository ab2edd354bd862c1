//! Audit-related error types.

use chronicle_config::ConfigError;
use chronicle_storage::StorageError;
use thiserror::Error;

/// Errors that can occur while recording or querying the audit trail.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The store configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An entry failed validation before reaching the store.
    #[error("invalid audit entry: {0}")]
    InvalidEntry(String),

    /// A query failed validation before reaching the store.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A scalar argument (id, identifier, limit, enum text) was rejected.
    #[error("{0}")]
    InvalidArgument(String),

    /// A store operation failed.
    #[error("failed to {operation}: {source}")]
    Storage {
        /// What was being attempted.
        operation: &'static str,
        /// The underlying store failure.
        #[source]
        source: StorageError,
    },

    /// Every insert attempt failed.
    #[error("failed to insert audit entry after {attempts} attempts: {source}")]
    InsertFailed {
        /// Total number of attempts made.
        attempts: u32,
        /// The failure of the last attempt.
        #[source]
        source: StorageError,
    },

    /// No audit service is bound to the builder or installed as the default.
    #[error(
        "no audit service configured: use set_default_service() or AuditBuilder::with_service()"
    )]
    NotConfigured,

    /// The caller's context was cancelled.
    #[error("{operation} cancelled")]
    Cancelled {
        /// The operation that was interrupted.
        operation: &'static str,
    },

    /// The caller's deadline passed before the operation finished.
    #[error("{operation} exceeded its deadline")]
    DeadlineExceeded {
        /// The operation that was interrupted.
        operation: &'static str,
    },

    /// An entry could not be converted to or from its stored form.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl AuditError {
    /// Wrap a store failure with the operation that hit it.
    #[must_use]
    pub fn storage(operation: &'static str, source: StorageError) -> Self {
        Self::Storage { operation, source }
    }

    /// Whether this error was raised by validation, before any store call.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidEntry(_) | Self::InvalidQuery(_) | Self::InvalidArgument(_)
        )
    }

    /// Whether this error comes from cancellation or deadline expiry.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::DeadlineExceeded { .. })
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_failed_names_attempt_count() {
        let err = AuditError::InsertFailed {
            attempts: 4,
            source: StorageError::Closed,
        };
        assert!(
            err.to_string()
                .starts_with("failed to insert audit entry after 4 attempts")
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(AuditError::InvalidEntry("x".into()).is_validation());
        assert!(AuditError::InvalidArgument("x".into()).is_validation());
        assert!(!AuditError::NotConfigured.is_validation());
        assert!(AuditError::Cancelled { operation: "insert" }.is_cancellation());
        assert!(AuditError::DeadlineExceeded { operation: "insert" }.is_cancellation());
        assert!(!AuditError::storage("count", StorageError::Closed).is_cancellation());
    }

    #[test]
    fn test_storage_error_message_names_operation() {
        let err = AuditError::storage("count audit entries", StorageError::Closed);
        assert_eq!(
            err.to_string(),
            "failed to count audit entries: database connection is closed"
        );
    }
}
