//! Error types for frontier-core

use crate::formula::FormulaError;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Insufficient funds: need {needed:.2}, have {balance:.2}")]
    InsufficientFunds { needed: f64, balance: f64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
