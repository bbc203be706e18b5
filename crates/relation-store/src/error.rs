use thiserror::Error;

use crate::PairKey;

/// Errors that can occur when interacting with the relation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An insert hit an existing record with the same kind and key.
    #[error("Record already exists: {kind} {key}")]
    AlreadyExists { kind: String, key: PairKey },

    /// An update targeted a record that does not exist.
    #[error("Record not found: {kind} {key}")]
    NotFound { kind: String, key: PairKey },

    /// The stored payload belongs to a different record kind.
    #[error("Record kind mismatch: expected {expected}, found {actual}")]
    KindMismatch { expected: String, actual: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store is unavailable.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for relation store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
