//! Border state model for database storage.

use crate::error::{Error, Result};
use frontier_core::Record;
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored border record, one row per world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredBorder {
    /// Primary key - world name.
    #[primary_key]
    pub world: String,
    /// Serialized flat record.
    pub data: Vec<u8>,
}

impl StoredBorder {
    /// Create from a world name and record.
    pub fn from_record(world: &str, record: &Record) -> Result<Self> {
        let data = bincode::serialize(record).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self {
            world: world.to_string(),
            data,
        })
    }

    /// Decode the stored record.
    pub fn to_record(&self) -> Result<Record> {
        bincode::deserialize(&self.data).map_err(|e| Error::Serialization(e.to_string()))
    }
}
