//! Per-player purchase progression
//!
//! One progression record exists per (player, world, price type). The level
//! counts successful purchases since the last reset and drives the
//! progressive price multiplier. Entries are cached in memory per player
//! with a bounded staleness window; a stale entry is reloaded from the
//! gateway inside the same call that reads or mutates it.

use crate::gateway::{progression_key, Gateway};
use crate::identity::{PlayerId, PriceType, WorldId};
use crate::time::{EpochMs, CACHE_STALE_MS, DAY_MS, MONTH_MS, WEEK_MS};
use crate::value::{record_float, record_int, record_str, Record, Value, ValueMap};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A rolling purchase window (daily, weekly, or monthly)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Window {
    /// When the current window opened
    pub started_at: EpochMs,
    /// Purchases inside the window
    pub purchases: u32,
    /// Currency spent inside the window
    pub spent: f64,
}

impl Window {
    fn roll(&mut self, period: EpochMs, now: EpochMs) {
        if now - self.started_at >= period {
            self.started_at = now;
            self.purchases = 0;
            self.spent = 0.0;
        }
    }

    fn record(&mut self, paid: f64) {
        self.purchases += 1;
        self.spent += paid;
    }
}

/// Purchase history for one (player, world, price type) triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    /// Which upgrade this progression tracks
    pub price_type: PriceType,
    /// Which world it is scoped to
    pub world: WorldId,
    level: u32,
    last_price: f64,
    total_spent: f64,
    last_purchase_at: EpochMs,
    last_reset_at: EpochMs,
    daily: Window,
    weekly: Window,
    monthly: Window,
}

impl Progression {
    /// Create a fresh progression at level 0
    pub fn new(world: WorldId, price_type: PriceType, now: EpochMs) -> Self {
        let window = Window {
            started_at: now,
            purchases: 0,
            spent: 0.0,
        };
        Self {
            price_type,
            world,
            level: 0,
            last_price: 0.0,
            total_spent: 0.0,
            last_purchase_at: 0,
            last_reset_at: now,
            daily: window,
            weekly: window,
            monthly: window,
        }
    }

    /// Purchases since the last reset
    pub fn level(&self) -> u32 {
        self.level
    }

    /// The price paid on the most recent purchase
    pub fn last_price(&self) -> f64 {
        self.last_price
    }

    /// Cumulative spend across all purchases
    pub fn total_spent(&self) -> f64 {
        self.total_spent
    }

    /// When the most recent purchase happened
    pub fn last_purchase_at(&self) -> EpochMs {
        self.last_purchase_at
    }

    /// When the level was last reset
    pub fn last_reset_at(&self) -> EpochMs {
        self.last_reset_at
    }

    /// The daily rolling window
    pub fn daily(&self) -> Window {
        self.daily
    }

    /// The weekly rolling window
    pub fn weekly(&self) -> Window {
        self.weekly
    }

    /// The monthly rolling window
    pub fn monthly(&self) -> Window {
        self.monthly
    }

    /// Record a successful purchase: level rises by exactly one
    pub fn advance(&mut self, paid: f64, now: EpochMs) {
        self.level += 1;
        self.last_price = paid;
        self.total_spent += paid;
        self.last_purchase_at = now;
        self.daily.roll(DAY_MS, now);
        self.weekly.roll(WEEK_MS, now);
        self.monthly.roll(MONTH_MS, now);
        self.daily.record(paid);
        self.weekly.record(paid);
        self.monthly.record(paid);
    }

    /// Zero the level and stamp the reset time
    pub fn reset(&mut self, now: EpochMs) {
        self.level = 0;
        self.last_reset_at = now;
    }

    fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert("priceType".into(), self.price_type.as_str().into());
        map.insert("worldName".into(), self.world.as_str().into());
        map.insert("level".into(), self.level.into());
        map.insert("lastPrice".into(), self.last_price.into());
        map.insert("totalSpent".into(), self.total_spent.into());
        map.insert("lastPurchaseAt".into(), self.last_purchase_at.into());
        map.insert("lastResetAt".into(), self.last_reset_at.into());
        map.insert("dailyStart".into(), self.daily.started_at.into());
        map.insert("dailyPurchases".into(), self.daily.purchases.into());
        map.insert("dailySpent".into(), self.daily.spent.into());
        map.insert("weeklyStart".into(), self.weekly.started_at.into());
        map.insert("weeklyPurchases".into(), self.weekly.purchases.into());
        map.insert("weeklySpent".into(), self.weekly.spent.into());
        map.insert("monthlyStart".into(), self.monthly.started_at.into());
        map.insert("monthlyPurchases".into(), self.monthly.purchases.into());
        map.insert("monthlySpent".into(), self.monthly.spent.into());
        map.into()
    }

    fn from_map(map: &ValueMap, now: EpochMs) -> Option<Self> {
        let price_type = PriceType::parse(record_str(map, "priceType", ""))?;
        let world = WorldId::new(record_str(map, "worldName", ""));
        Some(Self {
            price_type,
            world,
            level: record_int(map, "level", 0) as u32,
            last_price: record_float(map, "lastPrice", 0.0),
            total_spent: record_float(map, "totalSpent", 0.0),
            last_purchase_at: record_int(map, "lastPurchaseAt", 0),
            last_reset_at: record_int(map, "lastResetAt", now),
            daily: Window {
                started_at: record_int(map, "dailyStart", now),
                purchases: record_int(map, "dailyPurchases", 0) as u32,
                spent: record_float(map, "dailySpent", 0.0),
            },
            weekly: Window {
                started_at: record_int(map, "weeklyStart", now),
                purchases: record_int(map, "weeklyPurchases", 0) as u32,
                spent: record_float(map, "weeklySpent", 0.0),
            },
            monthly: Window {
                started_at: record_int(map, "monthlyStart", now),
                purchases: record_int(map, "monthlyPurchases", 0) as u32,
                spent: record_float(map, "monthlySpent", 0.0),
            },
        })
    }
}

/// Aggregate progression summary for one player in one world
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldProgressStats {
    /// Total purchases across all price types
    pub total_purchases: u32,
    /// Total spend across all price types
    pub total_spent: f64,
    /// Current level per price type
    pub levels: IndexMap<PriceType, u32>,
}

#[derive(Debug, Clone)]
struct PlayerProgress {
    /// Entries keyed "{world}:{price-type}"
    entries: IndexMap<String, Progression>,
    loaded_at: EpochMs,
    dirty: bool,
}

/// Store of all player progression records, cached with bounded staleness
#[derive(Debug, Clone, Default)]
pub struct ProgressionStore {
    players: IndexMap<PlayerId, PlayerProgress>,
}

fn entry_key(world: &WorldId, price_type: PriceType) -> String {
    format!("{}:{}", world, price_type.as_str())
}

impl ProgressionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load or reload a player's entries from the gateway when the cache is
    /// missing or stale.
    ///
    /// Called at the top of every operation that reads or mutates the
    /// player's records, inside the same `&mut self` borrow, so the reload
    /// can never interleave with the operation it guards.
    pub fn refresh_if_stale(&mut self, player: PlayerId, now: EpochMs, gateway: &dyn Gateway) {
        let reload = match self.players.get(&player) {
            None => true,
            Some(p) => !p.dirty && now - p.loaded_at > CACHE_STALE_MS,
        };
        if !reload {
            return;
        }
        let Ok(Some(record)) = gateway.load(&progression_key(player)) else {
            return;
        };
        self.insert_from_record(player, &record, now);
    }

    /// Get a progression entry
    pub fn get(
        &self,
        player: PlayerId,
        world: &WorldId,
        price_type: PriceType,
    ) -> Option<&Progression> {
        self.players
            .get(&player)?
            .entries
            .get(&entry_key(world, price_type))
    }

    /// Current level, treating a missing entry as level 0
    pub fn level(&self, player: PlayerId, world: &WorldId, price_type: PriceType) -> u32 {
        self.get(player, world, price_type)
            .map(|p| p.level())
            .unwrap_or(0)
    }

    /// Record a successful purchase, creating the entry lazily
    pub fn advance(
        &mut self,
        player: PlayerId,
        world: &WorldId,
        price_type: PriceType,
        paid: f64,
        now: EpochMs,
    ) {
        let progress = self.players.entry(player).or_insert_with(|| PlayerProgress {
            entries: IndexMap::new(),
            loaded_at: now,
            dirty: false,
        });
        let entry = progress
            .entries
            .entry(entry_key(world, price_type))
            .or_insert_with(|| Progression::new(world.clone(), price_type, now));
        entry.advance(paid, now);
        progress.loaded_at = now;
        progress.dirty = true;
    }

    /// Explicitly reset one progression to level 0
    pub fn reset(
        &mut self,
        player: PlayerId,
        world: &WorldId,
        price_type: PriceType,
        now: EpochMs,
    ) -> bool {
        let Some(progress) = self.players.get_mut(&player) else {
            return false;
        };
        let Some(entry) = progress.entries.get_mut(&entry_key(world, price_type)) else {
            return false;
        };
        entry.reset(now);
        progress.loaded_at = now;
        progress.dirty = true;
        true
    }

    /// Reset every progression the player holds in one world
    pub fn reset_all_for_world(
        &mut self,
        player: PlayerId,
        world: &WorldId,
        now: EpochMs,
    ) -> bool {
        let Some(progress) = self.players.get_mut(&player) else {
            return false;
        };
        let prefix = format!("{}:", world);
        let mut reset = false;
        for (key, entry) in progress.entries.iter_mut() {
            if key.starts_with(&prefix) {
                entry.reset(now);
                reset = true;
            }
        }
        if reset {
            progress.loaded_at = now;
            progress.dirty = true;
        }
        reset
    }

    /// Reset the level when the configured schedule period has elapsed.
    /// Returns true when a reset happened.
    pub fn apply_schedule_reset(
        &mut self,
        player: PlayerId,
        world: &WorldId,
        price_type: PriceType,
        period: EpochMs,
        now: EpochMs,
    ) -> bool {
        let Some(progress) = self.players.get_mut(&player) else {
            return false;
        };
        let Some(entry) = progress.entries.get_mut(&entry_key(world, price_type)) else {
            return false;
        };
        if now - entry.last_reset_at() < period {
            return false;
        }
        entry.reset(now);
        progress.dirty = true;
        true
    }

    /// Aggregate level/spend summary for a player's world
    pub fn stats_for_world(&self, player: PlayerId, world: &WorldId) -> WorldProgressStats {
        let mut stats = WorldProgressStats::default();
        let Some(progress) = self.players.get(&player) else {
            return stats;
        };
        let prefix = format!("{}:", world);
        for (key, entry) in &progress.entries {
            if key.starts_with(&prefix) {
                stats.total_purchases += entry.level();
                stats.total_spent += entry.total_spent();
                stats.levels.insert(entry.price_type, entry.level());
            }
        }
        stats
    }

    /// Whether any player has unflushed writes
    pub fn is_dirty(&self) -> bool {
        self.players.values().any(|p| p.dirty)
    }

    /// Number of cached players
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Check whether no players are cached
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Flatten one player's entries into a gateway record
    pub fn to_record(&self, player: PlayerId) -> Record {
        let mut record = Record::new();
        if let Some(progress) = self.players.get(&player) {
            for (key, entry) in &progress.entries {
                record.insert(key.clone(), entry.to_value());
            }
        }
        record
    }

    fn insert_from_record(&mut self, player: PlayerId, record: &Record, now: EpochMs) {
        let mut entries = IndexMap::new();
        for (key, value) in record {
            let Some(map) = value.as_map() else { continue };
            if let Some(entry) = Progression::from_map(map, now) {
                entries.insert(key.clone(), entry);
            }
        }
        self.players.insert(
            player,
            PlayerProgress {
                entries,
                loaded_at: now,
                dirty: false,
            },
        );
    }

    /// Load one player's entries from the gateway, replacing cached state
    pub fn load_player(
        &mut self,
        player: PlayerId,
        gateway: &dyn Gateway,
        now: EpochMs,
    ) -> crate::Result<()> {
        if let Some(record) = gateway.load(&progression_key(player))? {
            self.insert_from_record(player, &record, now);
        }
        Ok(())
    }

    /// Write one player's entries through the gateway
    pub fn flush(&mut self, player: PlayerId, gateway: &dyn Gateway) -> crate::Result<()> {
        let record = self.to_record(player);
        gateway.save(&progression_key(player), &record)?;
        if let Some(progress) = self.players.get_mut(&player) {
            progress.dirty = false;
        }
        Ok(())
    }

    /// Write every dirty player's entries through the gateway
    pub fn flush_all(&mut self, gateway: &dyn Gateway) -> crate::Result<()> {
        let dirty: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|(_, p)| p.dirty)
            .map(|(id, _)| *id)
            .collect();
        for player in dirty {
            self.flush(player, gateway)?;
        }
        Ok(())
    }

    /// Flush, then evict cache entries older than the staleness window
    pub fn sweep(&mut self, now: EpochMs, gateway: &dyn Gateway) -> crate::Result<()> {
        self.flush_all(gateway)?;
        self.players
            .retain(|_, progress| now - progress.loaded_at <= CACHE_STALE_MS);
        Ok(())
    }
}
