//! Frontier Script - RON config loader
//!
//! Loads the border economy's configuration from RON files:
//! - World defaults (the `defaults` block)
//! - Multiplier configs (the `multipliers` block)

mod error;
mod loader;
pub mod schema;

pub use error::{Error, Result};
pub use loader::{EconomyDefs, Loader};
