//! Single-row models: balances and multiplier configs.

use crate::error::{Error, Result};
use frontier_core::Record;
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored balances record. Single row keyed "balances".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredBalances {
    /// Always "balances" - single row.
    #[primary_key]
    pub id: String,
    /// Serialized player-id to balance record.
    pub data: Vec<u8>,
}

impl StoredBalances {
    /// Create from the balances record.
    pub fn from_record(record: &Record) -> Result<Self> {
        let data = bincode::serialize(record).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self {
            id: "balances".to_string(),
            data,
        })
    }

    /// Decode the stored record.
    pub fn to_record(&self) -> Result<Record> {
        bincode::deserialize(&self.data).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Stored multiplier-config record. Single row keyed "multipliers".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 4, version = 1)]
#[native_db]
pub struct StoredMultipliers {
    /// Always "multipliers" - single row.
    #[primary_key]
    pub id: String,
    /// Serialized price-type to config record.
    pub data: Vec<u8>,
}

impl StoredMultipliers {
    /// Create from the multipliers record.
    pub fn from_record(record: &Record) -> Result<Self> {
        let data = bincode::serialize(record).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self {
            id: "multipliers".to_string(),
            data,
        })
    }

    /// Decode the stored record.
    pub fn to_record(&self) -> Result<Record> {
        bincode::deserialize(&self.data).map_err(|e| Error::Serialization(e.to_string()))
    }
}
