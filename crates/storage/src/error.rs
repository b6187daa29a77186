//! Error types for the storage layer.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// An accessor or session was requested before `open()` succeeded, or
    /// after `close()`. This is a programming-contract violation, not a
    /// transient condition.
    #[error("storage session is not opened")]
    NotOpened,

    /// The CQL driver reported an error.
    #[error("cassandra error: {0}")]
    Cassandra(#[from] cdrs_tokio::error::Error),

    /// The Elasticsearch client reported an error.
    #[error("elasticsearch error: {0}")]
    Elasticsearch(#[from] elasticsearch::Error),

    /// Establishing the row-store session failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Executing a schema bootstrap statement failed.
    #[error("schema bootstrap failed: {message}")]
    Schema { message: String },

    /// The search index could not be created.
    #[error("search index creation failed (status {status}): {message}")]
    IndexCreation { status: u16, message: String },

    /// A row could not be decoded into its record type.
    #[error("invalid row for {table}: {message}")]
    InvalidRow { table: &'static str, message: String },

    /// An invariant inside the storage layer was violated.
    #[error("internal storage error: {message}")]
    Internal { message: String },
}

/// Convenience alias for storage operation results.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_opened_display() {
        let err = StorageError::NotOpened;
        assert_eq!(err.to_string(), "storage session is not opened");
    }

    #[test]
    fn test_invalid_row_display() {
        let err = StorageError::InvalidRow {
            table: "baskets.baskets",
            message: "missing id".into(),
        };
        assert!(err.to_string().contains("baskets.baskets"));
        assert!(err.to_string().contains("missing id"));
    }
}
