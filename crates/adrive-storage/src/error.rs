//! Storage error types.

use thiserror::Error;

/// Errors raised by the key-value persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A key or table name does not match `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("invalid identifier '{0}': must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidIdentifier(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("value under '{key}' is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("index {index} out of range for '{key}' (len {len})")]
    IndexOutOfRange {
        key: String,
        index: usize,
        len: usize,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] redb::Error),
}

macro_rules! impl_from_redb {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for StoreError {
                fn from(error: $source) -> Self {
                    StoreError::Database(error.into())
                }
            }
        )*
    };
}

impl_from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl StoreError {
    /// True when the error reports an absent key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StoreError>;
