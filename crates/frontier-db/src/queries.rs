//! Common query patterns for the database.

use crate::error::{Error, Result};
use crate::models::*;
use crate::store::Store;

impl Store {
    /// All world names with a stored border record.
    pub fn border_worlds(&self) -> Result<Vec<String>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredBorder>()?;
        let iter = scan.all()?;
        let rows: std::result::Result<Vec<StoredBorder>, _> = iter.collect();
        let rows = rows.map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|b| b.world).collect())
    }

    /// Number of worlds with a stored border record.
    pub fn count_borders(&self) -> Result<usize> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredBorder>()?;
        let iter = scan.all()?;
        Ok(iter.count())
    }

    /// All player ids with a stored progression record.
    pub fn progression_players(&self) -> Result<Vec<u64>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredProgression>()?;
        let iter = scan.all()?;
        let rows: std::result::Result<Vec<StoredProgression>, _> = iter.collect();
        let rows = rows.map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|p| p.player).collect())
    }
}
