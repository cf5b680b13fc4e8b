//! Unified error types for todofile

use thiserror::Error;

/// Unified error type for task store operations
#[derive(Error, Debug)]
pub enum TodoError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Todo not found: {0}")]
    NotFound(u64),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias using TodoError
pub type Result<T> = std::result::Result<T, TodoError>;

/// Bearer-token authentication failures
///
/// Each variant maps to a distinct HTTP status at the dispatch layer:
/// `ServerMisconfigured` is a 500, everything else a 401.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Server configuration error: TOKEN not set")]
    ServerMisconfigured,

    #[error("Authorization header is missing")]
    MissingHeader,

    #[error("Authorization header must be in format: Bearer TOKEN")]
    MalformedHeader,

    #[error("Invalid token")]
    InvalidToken,
}

/// Failures from the persistence layer
///
/// Never reaches an HTTP client: the store self-heals missing/corrupt
/// documents at load time and logs write failures without rolling back.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("document not found")]
    NotFound,

    #[error("document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
