//! Database store wrapper.

use crate::error::{Error, Result};
use crate::models::*;
use frontier_core::{Gateway, Record};
use native_db::*;
use std::path::Path;
use std::sync::LazyLock;

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredBorder>().unwrap();
    models.define::<StoredProgression>().unwrap();
    models.define::<StoredBalances>().unwrap();
    models.define::<StoredMultipliers>().unwrap();
    models
});

/// Database store for durable border economy state.
pub struct Store {
    pub(crate) db: Database<'static>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Save a world's border record.
    pub fn save_border(&self, world: &str, record: &Record) -> Result<()> {
        let stored = StoredBorder::from_record(world, record)?;
        let rw = self.db.rw_transaction()?;
        rw.upsert(stored)?;
        rw.commit()?;
        Ok(())
    }

    /// Load a world's border record.
    pub fn load_border(&self, world: &str) -> Result<Option<Record>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredBorder> = r.get().primary(world.to_string())?;
        stored.map(|s| s.to_record()).transpose()
    }

    /// Save a player's progression record.
    pub fn save_progression(&self, player: u64, record: &Record) -> Result<()> {
        let stored = StoredProgression::from_record(player, record)?;
        let rw = self.db.rw_transaction()?;
        rw.upsert(stored)?;
        rw.commit()?;
        Ok(())
    }

    /// Load a player's progression record.
    pub fn load_progression(&self, player: u64) -> Result<Option<Record>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredProgression> = r.get().primary(player)?;
        stored.map(|s| s.to_record()).transpose()
    }

    /// Save the balances record.
    pub fn save_balances(&self, record: &Record) -> Result<()> {
        let stored = StoredBalances::from_record(record)?;
        let rw = self.db.rw_transaction()?;
        rw.upsert(stored)?;
        rw.commit()?;
        Ok(())
    }

    /// Load the balances record.
    pub fn load_balances(&self) -> Result<Option<Record>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredBalances> = r.get().primary("balances".to_string())?;
        stored.map(|s| s.to_record()).transpose()
    }

    /// Save the multiplier-config record.
    pub fn save_multipliers(&self, record: &Record) -> Result<()> {
        let stored = StoredMultipliers::from_record(record)?;
        let rw = self.db.rw_transaction()?;
        rw.upsert(stored)?;
        rw.commit()?;
        Ok(())
    }

    /// Load the multiplier-config record.
    pub fn load_multipliers(&self) -> Result<Option<Record>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredMultipliers> = r.get().primary("multipliers".to_string())?;
        stored.map(|s| s.to_record()).transpose()
    }
}

impl Gateway for Store {
    fn load(&self, key: &str) -> frontier_core::Result<Option<Record>> {
        if let Some(world) = key.strip_prefix("border/") {
            return Ok(self.load_border(world)?);
        }
        if let Some(player) = key.strip_prefix("progression/") {
            let Ok(player) = player.parse::<u64>() else {
                return Err(Error::UnknownKey(key.to_string()).into());
            };
            return Ok(self.load_progression(player)?);
        }
        match key {
            "balances" => Ok(self.load_balances()?),
            "multipliers" => Ok(self.load_multipliers()?),
            _ => Err(Error::UnknownKey(key.to_string()).into()),
        }
    }

    fn save(&self, key: &str, record: &Record) -> frontier_core::Result<()> {
        if let Some(world) = key.strip_prefix("border/") {
            return Ok(self.save_border(world, record)?);
        }
        if let Some(player) = key.strip_prefix("progression/") {
            let Ok(player) = player.parse::<u64>() else {
                return Err(Error::UnknownKey(key.to_string()).into());
            };
            return Ok(self.save_progression(player, record)?);
        }
        match key {
            "balances" => Ok(self.save_balances(record)?),
            "multipliers" => Ok(self.save_multipliers(record)?),
            _ => Err(Error::UnknownKey(key.to_string()).into()),
        }
    }

    fn list_keys(&self, prefix: &str) -> frontier_core::Result<Vec<String>> {
        let mut keys = Vec::new();
        for world in self.border_worlds()? {
            keys.push(format!("border/{}", world));
        }
        for player in self.progression_players()? {
            keys.push(format!("progression/{}", player));
        }
        if self.load_balances()?.is_some() {
            keys.push("balances".to_string());
        }
        if self.load_multipliers()?.is_some() {
            keys.push("multipliers".to_string());
        }
        keys.retain(|k| k.starts_with(prefix));
        Ok(keys)
    }
}

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}
