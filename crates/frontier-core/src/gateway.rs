//! Persistence gateway interface
//!
//! The engine is in-memory-authoritative; durable state flows through this
//! trait as flat field-to-value records. Implementations decide where the
//! records live (an embedded database, files, a test map).

use crate::{Error, PlayerId, Record, Result, WorldId};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Key for a world's border state record
pub fn border_key(world: &WorldId) -> String {
    format!("border/{}", world)
}

/// Key for a player's progression record
pub fn progression_key(player: PlayerId) -> String {
    format!("progression/{}", player.raw())
}

/// Key for the single balances record
pub const BALANCES_KEY: &str = "balances";

/// Key for the single multiplier-config record
pub const MULTIPLIERS_KEY: &str = "multipliers";

/// Durable key-value storage of engine records
pub trait Gateway {
    /// Load the record stored under a key, if any
    fn load(&self, key: &str) -> Result<Option<Record>>;

    /// Write the record stored under a key
    fn save(&self, key: &str, record: &Record) -> Result<()>;

    /// List all stored keys starting with a prefix
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;
}

// A shared handle to a gateway is itself a gateway. Hosts hand the same
// storage to the engine and to their own inspection/backup code this way.
impl<G: Gateway + ?Sized> Gateway for std::rc::Rc<G> {
    fn load(&self, key: &str) -> Result<Option<Record>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, record: &Record) -> Result<()> {
        (**self).save(key, record)
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).list_keys(prefix)
    }
}

/// In-memory gateway for tests and hosts that opt out of durable storage
#[derive(Debug, Default)]
pub struct MemoryGateway {
    records: Mutex<BTreeMap<String, Record>>,
}

impl MemoryGateway {
    /// Create an empty in-memory gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.lock().expect("gateway lock").len()
    }

    /// Check whether the gateway holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Gateway for MemoryGateway {
    fn load(&self, key: &str) -> Result<Option<Record>> {
        let records = self
            .records
            .lock()
            .map_err(|_| Error::Persistence("gateway lock poisoned".to_string()))?;
        Ok(records.get(key).cloned())
    }

    fn save(&self, key: &str, record: &Record) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| Error::Persistence("gateway lock poisoned".to_string()))?;
        records.insert(key.to_string(), record.clone());
        Ok(())
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let records = self
            .records
            .lock()
            .map_err(|_| Error::Persistence("gateway lock poisoned".to_string()))?;
        Ok(records
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn test_keys() {
        assert_eq!(border_key(&WorldId::new("overworld")), "border/overworld");
        assert_eq!(progression_key(PlayerId::new(9)), "progression/9");
    }

    #[test]
    fn test_memory_gateway_round_trip() {
        let gateway = MemoryGateway::new();
        assert!(gateway.is_empty());

        let mut record = Record::new();
        record.insert("currentSize".to_string(), Value::Float(1000.0));
        gateway.save("border/overworld", &record).unwrap();

        let loaded = gateway.load("border/overworld").unwrap().unwrap();
        assert_eq!(loaded.get("currentSize"), Some(&Value::Float(1000.0)));
        assert!(gateway.load("border/nether").unwrap().is_none());
    }

    #[test]
    fn test_list_keys_prefix() {
        let gateway = MemoryGateway::new();
        gateway.save("border/overworld", &Record::new()).unwrap();
        gateway.save("border/nether", &Record::new()).unwrap();
        gateway.save("balances", &Record::new()).unwrap();

        let mut keys = gateway.list_keys("border/").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["border/nether", "border/overworld"]);
    }
}
