//! Progression model for database storage.

use crate::error::{Error, Result};
use frontier_core::Record;
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored progression record, one row per player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredProgression {
    /// Primary key - player id.
    #[primary_key]
    pub player: u64,
    /// Serialized flat record, keyed "{world}:{price-type}".
    pub data: Vec<u8>,
}

impl StoredProgression {
    /// Create from a player id and record.
    pub fn from_record(player: u64, record: &Record) -> Result<Self> {
        let data = bincode::serialize(record).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self { player, data })
    }

    /// Decode the stored record.
    pub fn to_record(&self) -> Result<Record> {
        bincode::deserialize(&self.data).map_err(|e| Error::Serialization(e.to_string()))
    }
}
