//! Frontier DB - Durable storage using native_db
//!
//! Implements the core persistence gateway over an embedded database:
//! - Border records, one row per world
//! - Progression records, one row per player
//! - Single-row balances and multiplier-config records

mod error;
mod models;
mod queries;
mod store;

pub use error::{Error, Result};
pub use store::Store;
