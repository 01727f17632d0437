//! Error types for file exchange operations

use adrive_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by the exchange, quota and admin services.
#[derive(Error, Debug)]
pub enum DriveError {
    /// No live blob/registry pair matches the code.
    #[error("invalid or already-used code")]
    InvalidCode,

    #[error("you do not own this file")]
    Forbidden,

    #[error("upload exceeds the size limit of {limit_bytes} bytes")]
    OversizedUpload { limit_bytes: u64 },

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("username already taken: {0}")]
    UserExists(String),

    #[error("invalid quota: {0}")]
    InvalidQuota(f64),

    #[error("no free download code after {0} attempts")]
    CodeSpaceExhausted(usize),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for drive operations
pub type Result<T> = std::result::Result<T, DriveError>;
