//! Error types for frontier-script

use thiserror::Error;

/// Config loading error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Unknown price type: {0}")]
    UnknownPriceType(String),

    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
