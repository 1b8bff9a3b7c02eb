//! Error types for database operations.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Native DB error.
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Key does not match any stored record family.
    #[error("Unknown record key: {0}")]
    UnknownKey(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for frontier_core::Error {
    fn from(err: Error) -> Self {
        frontier_core::Error::Persistence(err.to_string())
    }
}
