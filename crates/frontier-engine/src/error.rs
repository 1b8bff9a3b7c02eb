//! Error types for frontier-engine

use thiserror::Error;

/// Engine error type for administrative and lifecycle operations.
///
/// Player purchase operations never return these; they are recovered at the
/// orchestrator boundary into a `PurchaseOutcome`.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] frontier_core::Error),

    #[error("Unknown world: {0}")]
    UnknownWorld(String),

    #[error("Value out of range: {0}")]
    OutOfRange(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
