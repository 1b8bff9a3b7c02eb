//! Currency accounts and the economy capability interface
//!
//! The orchestrator spends through `CurrencySource`, a capability the host
//! either supplies (an external economy provider) or omits, in which case the
//! built-in `Ledger` is used. Both uphold the same contract: balances never
//! go negative, and every debit checks sufficiency and mutates in the same
//! call.

use crate::gateway::{Gateway, BALANCES_KEY};
use crate::identity::PlayerId;
use crate::time::{EpochMs, CACHE_STALE_MS};
use crate::value::{Record, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An external currency provider the host can wire in at construction time
pub trait CurrencySource {
    /// Current balance for a player
    fn balance(&mut self, player: PlayerId) -> f64;

    /// Check the player can afford an amount
    fn has_enough(&mut self, player: PlayerId, amount: f64) -> bool {
        self.balance(player) >= amount
    }

    /// Withdraw an amount. Fails, leaving the balance untouched, when the
    /// amount is non-positive or exceeds the balance.
    fn debit(&mut self, player: PlayerId, amount: f64) -> bool;

    /// Deposit an amount. Fails when the amount is non-positive.
    fn credit(&mut self, player: PlayerId, amount: f64) -> bool;
}

/// One cached currency account
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    balance: f64,
    /// When this entry was last loaded or written
    loaded_at: EpochMs,
    /// Whether the entry has writes not yet flushed to the gateway
    dirty: bool,
}

/// The built-in currency ledger
///
/// Accounts are cached in memory with a bounded staleness window: a read
/// older than `CACHE_STALE_MS` reloads from the gateway before being served.
/// Writes always land in the cache and mark the entry dirty for the next
/// flush. Reload-if-stale and mutate happen inside one `&mut self` call, so
/// a purchase can never interleave with a reload of the same account.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    accounts: IndexMap<PlayerId, Account>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every balance from the gateway, replacing cached state
    pub fn load_all(&mut self, gateway: &dyn Gateway, now: EpochMs) -> crate::Result<()> {
        self.accounts.clear();
        if let Some(record) = gateway.load(BALANCES_KEY)? {
            for (key, value) in &record {
                let (Ok(id), Some(balance)) = (key.parse::<u64>(), value.as_float()) else {
                    continue;
                };
                self.accounts.insert(
                    PlayerId::new(id),
                    Account {
                        balance: balance.max(0.0),
                        loaded_at: now,
                        dirty: false,
                    },
                );
            }
        }
        Ok(())
    }

    fn reload_if_stale(&mut self, player: PlayerId, now: EpochMs, gateway: &dyn Gateway) {
        let stale = self
            .accounts
            .get(&player)
            .is_some_and(|a| !a.dirty && now - a.loaded_at > CACHE_STALE_MS);
        if !stale {
            return;
        }
        let Ok(Some(record)) = gateway.load(BALANCES_KEY) else {
            return;
        };
        if let Some(balance) = record
            .get(&player.raw().to_string())
            .and_then(|v| v.as_float())
        {
            self.accounts.insert(
                player,
                Account {
                    balance: balance.max(0.0),
                    loaded_at: now,
                    dirty: false,
                },
            );
        }
    }

    /// Current balance, reloading a stale cache entry first
    pub fn balance(&mut self, player: PlayerId, now: EpochMs, gateway: &dyn Gateway) -> f64 {
        self.reload_if_stale(player, now, gateway);
        self.accounts.get(&player).map(|a| a.balance).unwrap_or(0.0)
    }

    /// Check the player can afford an amount
    pub fn has_enough(
        &mut self,
        player: PlayerId,
        amount: f64,
        now: EpochMs,
        gateway: &dyn Gateway,
    ) -> bool {
        self.balance(player, now, gateway) >= amount
    }

    /// Withdraw an amount. The sufficiency check and the mutation share one
    /// critical section; on failure the balance is untouched.
    pub fn debit(
        &mut self,
        player: PlayerId,
        amount: f64,
        now: EpochMs,
        gateway: &dyn Gateway,
    ) -> bool {
        if amount <= 0.0 {
            return false;
        }
        self.reload_if_stale(player, now, gateway);
        let Some(account) = self.accounts.get_mut(&player) else {
            return false;
        };
        if account.balance < amount {
            return false;
        }
        account.balance -= amount;
        account.loaded_at = now;
        account.dirty = true;
        true
    }

    /// Deposit an amount, creating the account if needed
    pub fn credit(&mut self, player: PlayerId, amount: f64, now: EpochMs) -> bool {
        if amount <= 0.0 {
            return false;
        }
        let account = self.accounts.entry(player).or_insert(Account {
            balance: 0.0,
            loaded_at: now,
            dirty: true,
        });
        account.balance += amount;
        account.loaded_at = now;
        account.dirty = true;
        true
    }

    /// Overwrite a balance directly (bootstrap and admin use)
    pub fn set_balance(&mut self, player: PlayerId, balance: f64, now: EpochMs) {
        self.accounts.insert(
            player,
            Account {
                balance: balance.max(0.0),
                loaded_at: now,
                dirty: true,
            },
        );
    }

    /// Whether any account has unflushed writes
    pub fn is_dirty(&self) -> bool {
        self.accounts.values().any(|a| a.dirty)
    }

    /// Number of cached accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Check whether no accounts are cached
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Flatten every cached account into the balances record
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        for (player, account) in &self.accounts {
            record.insert(player.raw().to_string(), Value::Float(account.balance));
        }
        record
    }

    /// Write all balances through the gateway and clear dirty flags
    pub fn flush(&mut self, gateway: &dyn Gateway) -> crate::Result<()> {
        if !self.is_dirty() {
            return Ok(());
        }
        // The balances record is a single key, so a flush merges the cache
        // over whatever the gateway already holds for evicted players.
        let mut record = match gateway.load(BALANCES_KEY)? {
            Some(existing) => existing,
            None => Record::new(),
        };
        for (player, account) in &self.accounts {
            record.insert(player.raw().to_string(), Value::Float(account.balance));
        }
        gateway.save(BALANCES_KEY, &record)?;
        for account in self.accounts.values_mut() {
            account.dirty = false;
        }
        Ok(())
    }

    /// Flush, then evict cache entries older than the staleness window
    pub fn sweep(&mut self, now: EpochMs, gateway: &dyn Gateway) -> crate::Result<()> {
        self.flush(gateway)?;
        self.accounts
            .retain(|_, account| now - account.loaded_at <= CACHE_STALE_MS);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;

    #[test]
    fn test_credit_and_debit() {
        let gateway = MemoryGateway::new();
        let mut ledger = Ledger::new();
        let player = PlayerId::new(1);

        assert!(ledger.credit(player, 100.0, 1_000));
        assert_eq!(ledger.balance(player, 1_000, &gateway), 100.0);

        assert!(ledger.debit(player, 40.0, 1_000, &gateway));
        assert_eq!(ledger.balance(player, 1_000, &gateway), 60.0);
    }

    #[test]
    fn test_debit_insufficient_leaves_balance_untouched() {
        let gateway = MemoryGateway::new();
        let mut ledger = Ledger::new();
        let player = PlayerId::new(1);
        ledger.credit(player, 50.0, 1_000);

        assert!(!ledger.debit(player, 100.0, 1_000, &gateway));
        assert_eq!(ledger.balance(player, 1_000, &gateway), 50.0);
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        let gateway = MemoryGateway::new();
        let mut ledger = Ledger::new();
        let player = PlayerId::new(1);
        ledger.credit(player, 50.0, 1_000);

        assert!(!ledger.debit(player, 0.0, 1_000, &gateway));
        assert!(!ledger.debit(player, -5.0, 1_000, &gateway));
        assert!(!ledger.credit(player, 0.0, 1_000));
        assert!(!ledger.credit(player, -5.0, 1_000));
        assert_eq!(ledger.balance(player, 1_000, &gateway), 50.0);
    }

    #[test]
    fn test_unknown_player_has_zero_balance() {
        let gateway = MemoryGateway::new();
        let mut ledger = Ledger::new();
        let player = PlayerId::new(42);

        assert_eq!(ledger.balance(player, 1_000, &gateway), 0.0);
        assert!(!ledger.debit(player, 1.0, 1_000, &gateway));
    }

    #[test]
    fn test_flush_and_reload() {
        let gateway = MemoryGateway::new();
        let mut ledger = Ledger::new();
        let player = PlayerId::new(1);
        ledger.credit(player, 75.0, 1_000);
        ledger.flush(&gateway).unwrap();
        assert!(!ledger.is_dirty());

        let mut restored = Ledger::new();
        restored.load_all(&gateway, 2_000).unwrap();
        assert_eq!(restored.balance(player, 2_000, &gateway), 75.0);
    }

    #[test]
    fn test_stale_entry_reloads_from_gateway() {
        let gateway = MemoryGateway::new();
        let mut ledger = Ledger::new();
        let player = PlayerId::new(1);
        ledger.credit(player, 75.0, 1_000);
        ledger.flush(&gateway).unwrap();

        // Another process rewrites the durable record
        let mut record = Record::new();
        record.insert("1".to_string(), Value::Float(500.0));
        gateway.save(BALANCES_KEY, &record).unwrap();

        // Within the window the cache is served
        assert_eq!(ledger.balance(player, 1_000 + CACHE_STALE_MS, &gateway), 75.0);
        // Past the window the gateway wins
        assert_eq!(
            ledger.balance(player, 1_001 + CACHE_STALE_MS, &gateway),
            500.0
        );
    }

    #[test]
    fn test_dirty_entry_is_not_reloaded() {
        let gateway = MemoryGateway::new();
        let mut record = Record::new();
        record.insert("1".to_string(), Value::Float(10.0));
        gateway.save(BALANCES_KEY, &record).unwrap();

        let mut ledger = Ledger::new();
        let player = PlayerId::new(1);
        ledger.credit(player, 75.0, 1_000);

        // Unflushed writes must not be clobbered by a staleness reload
        assert_eq!(ledger.balance(player, 1_001 + CACHE_STALE_MS, &gateway), 75.0);
    }

    #[test]
    fn test_sweep_flushes_then_evicts() {
        let gateway = MemoryGateway::new();
        let mut ledger = Ledger::new();
        let player = PlayerId::new(1);
        ledger.credit(player, 75.0, 1_000);

        ledger.sweep(1_001 + CACHE_STALE_MS, &gateway).unwrap();
        assert!(ledger.is_empty());

        // The write survived the eviction
        let record = gateway.load(BALANCES_KEY).unwrap().unwrap();
        assert_eq!(record.get("1"), Some(&Value::Float(75.0)));
    }
}
