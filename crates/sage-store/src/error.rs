//! Error types for sage-store.

use thiserror::Error;

/// Result type for sage-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sage-store operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Collection already exists.
    #[error("Collection '{0}' already exists")]
    CollectionExists(String),

    /// Collection not found.
    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    /// Secondary index not found on a collection.
    #[error("Index '{index}' not found on collection '{collection}'")]
    IndexNotFound {
        /// Collection name.
        collection: String,
        /// Index name that was requested.
        index: String,
    },

    /// Record is not a JSON object and cannot be stored.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Persistence error (I/O, serialization, etc.).
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
