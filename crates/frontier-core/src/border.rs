//! Per-world border state and its invariant-enforcing mutators
//!
//! A border is a square boundary whose half-width is `size`. Every live
//! value is clamped into the world's absolute bounds on write; absolute
//! bound edits pull the player bounds and live values inward when they fall
//! outside the new range. World records are never deleted by the engine.

use crate::identity::{PriceType, WorldId};
use crate::time::EpochMs;
use crate::value::{record_bool, record_float, record_int, Record, ValueMap};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// Hard ranges for administrator edits. Everything else clamps against the
// per-world absolute bounds, which themselves clamp against these.
const ADMIN_MAX_SIZE_RANGE: (f64, f64) = (10.0, 1_000_000.0);
const ADMIN_MIN_SIZE_RANGE: (f64, f64) = (1.0, 10_000.0);
const ADMIN_MAX_SPEED_RANGE: (f64, f64) = (0.1, 100.0);
const ADMIN_MIN_SPEED_RANGE: (f64, f64) = (0.01, 10.0);
const ADMIN_MAX_DAMAGE_RANGE: (f64, f64) = (0.0, 500.0);
const ADMIN_MIN_DAMAGE_RANGE: (f64, f64) = (0.0, 50.0);
const COST_RANGE: (f64, f64) = (0.01, 1_000.0);
const STEP_SIZE_RANGE: (f64, f64) = (0.1, 1_000.0);
const STEP_FINE_RANGE: (f64, f64) = (0.01, 10.0);
const SCALAR_RANGE: (f64, f64) = (0.1, 10.0);

fn clamp(value: f64, range: (f64, f64)) -> f64 {
    value.clamp(range.0, range.1)
}

/// Default-population policy for worlds seen for the first time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldDefaults {
    #[serde(default = "defaults::size")]
    pub size: f64,
    #[serde(default = "defaults::speed")]
    pub speed: f64,
    #[serde(default = "defaults::damage")]
    pub damage: f64,
    #[serde(default = "defaults::warning_distance")]
    pub warning_distance: f64,
    #[serde(default = "defaults::damage_buffer")]
    pub damage_buffer: f64,
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,
    #[serde(default = "defaults::enabled")]
    pub upgradable: bool,
    #[serde(default = "defaults::enabled")]
    pub shop_enabled: bool,
    #[serde(default = "defaults::player_min_size")]
    pub player_min_size: f64,
    #[serde(default = "defaults::player_max_size")]
    pub player_max_size: f64,
    #[serde(default = "defaults::player_min_speed")]
    pub player_min_speed: f64,
    #[serde(default = "defaults::player_max_speed")]
    pub player_max_speed: f64,
    #[serde(default = "defaults::player_min_damage")]
    pub player_min_damage: f64,
    #[serde(default = "defaults::player_max_damage")]
    pub player_max_damage: f64,
    #[serde(default = "defaults::expand_cost")]
    pub expand_cost: f64,
    #[serde(default = "defaults::shrink_cost")]
    pub shrink_cost: f64,
    #[serde(default = "defaults::speed_up_cost")]
    pub speed_up_cost: f64,
    #[serde(default = "defaults::speed_down_cost")]
    pub speed_down_cost: f64,
    #[serde(default = "defaults::damage_up_cost")]
    pub damage_up_cost: f64,
    #[serde(default = "defaults::damage_down_cost")]
    pub damage_down_cost: f64,
    #[serde(default = "defaults::step_size")]
    pub upgrade_step_size: f64,
    #[serde(default = "defaults::step_speed")]
    pub upgrade_step_speed: f64,
    #[serde(default = "defaults::step_damage")]
    pub upgrade_step_damage: f64,
}

mod defaults {
    pub fn size() -> f64 {
        1000.0
    }
    pub fn speed() -> f64 {
        1.0
    }
    pub fn damage() -> f64 {
        2.0
    }
    pub fn warning_distance() -> f64 {
        10.0
    }
    pub fn damage_buffer() -> f64 {
        5.0
    }
    pub fn enabled() -> bool {
        true
    }
    pub fn player_min_size() -> f64 {
        50.0
    }
    pub fn player_max_size() -> f64 {
        30_000.0
    }
    pub fn player_min_speed() -> f64 {
        0.5
    }
    pub fn player_max_speed() -> f64 {
        5.0
    }
    pub fn player_min_damage() -> f64 {
        0.5
    }
    pub fn player_max_damage() -> f64 {
        10.0
    }
    pub fn expand_cost() -> f64 {
        1.0
    }
    pub fn shrink_cost() -> f64 {
        0.5
    }
    pub fn speed_up_cost() -> f64 {
        15.0
    }
    pub fn speed_down_cost() -> f64 {
        5.0
    }
    pub fn damage_up_cost() -> f64 {
        8.0
    }
    pub fn damage_down_cost() -> f64 {
        12.0
    }
    pub fn step_size() -> f64 {
        1.0
    }
    pub fn step_speed() -> f64 {
        0.1
    }
    pub fn step_damage() -> f64 {
        0.1
    }
}

impl Default for WorldDefaults {
    fn default() -> Self {
        Self {
            size: defaults::size(),
            speed: defaults::speed(),
            damage: defaults::damage(),
            warning_distance: defaults::warning_distance(),
            damage_buffer: defaults::damage_buffer(),
            enabled: true,
            upgradable: true,
            shop_enabled: true,
            player_min_size: defaults::player_min_size(),
            player_max_size: defaults::player_max_size(),
            player_min_speed: defaults::player_min_speed(),
            player_max_speed: defaults::player_max_speed(),
            player_min_damage: defaults::player_min_damage(),
            player_max_damage: defaults::player_max_damage(),
            expand_cost: defaults::expand_cost(),
            shrink_cost: defaults::shrink_cost(),
            speed_up_cost: defaults::speed_up_cost(),
            speed_down_cost: defaults::speed_down_cost(),
            damage_up_cost: defaults::damage_up_cost(),
            damage_down_cost: defaults::damage_down_cost(),
            upgrade_step_size: defaults::step_size(),
            upgrade_step_speed: defaults::step_speed(),
            upgrade_step_damage: defaults::step_damage(),
        }
    }
}

/// The border economy state for one world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderState {
    world: WorldId,
    enabled: bool,
    upgradable: bool,
    shop_enabled: bool,

    // Live values
    size: f64,
    speed: f64,
    damage: f64,
    warning_distance: f64,
    damage_buffer: f64,

    // Absolute bounds, set only by administrators
    absolute_max_size: f64,
    absolute_min_size: f64,
    absolute_max_speed: f64,
    absolute_min_speed: f64,
    absolute_max_damage: f64,
    absolute_min_damage: f64,

    // Player bounds, within the absolute range
    player_max_size: f64,
    player_min_size: f64,
    player_max_speed: f64,
    player_min_speed: f64,
    player_max_damage: f64,
    player_min_damage: f64,

    // Base costs per operation
    expand_cost: f64,
    shrink_cost: f64,
    speed_up_cost: f64,
    speed_down_cost: f64,
    damage_up_cost: f64,
    damage_down_cost: f64,

    // Upgrade step sizes
    upgrade_step_size: f64,
    upgrade_step_speed: f64,
    upgrade_step_damage: f64,

    // Static per-world price scalars (distinct from progressive multipliers)
    price_scalar_size: f64,
    price_scalar_speed: f64,
    price_scalar_damage: f64,

    // Counters
    total_expansions: u32,
    total_shrinks: u32,
    total_speed_ups: u32,
    total_speed_downs: u32,
    total_damage_ups: u32,
    total_damage_downs: u32,
    total_spent: f64,
    total_earned: f64,

    // Timestamps
    created_at: EpochMs,
    last_modified: EpochMs,
    last_expansion: EpochMs,
    last_shrink: EpochMs,

    // Sell-shop item prices
    item_prices: IndexMap<String, f64>,
}

impl BorderState {
    /// Create border state with built-in defaults
    pub fn new(world: WorldId, now: EpochMs) -> Self {
        Self::with_defaults(world, &WorldDefaults::default(), now)
    }

    /// Create border state populated from a default policy
    pub fn with_defaults(world: WorldId, defaults: &WorldDefaults, now: EpochMs) -> Self {
        let mut state = Self {
            world,
            enabled: defaults.enabled,
            upgradable: defaults.upgradable,
            shop_enabled: defaults.shop_enabled,
            size: defaults.size,
            speed: defaults.speed,
            damage: defaults.damage,
            warning_distance: defaults.warning_distance,
            damage_buffer: defaults.damage_buffer,
            absolute_max_size: 30_000.0,
            absolute_min_size: 50.0,
            absolute_max_speed: 10.0,
            absolute_min_speed: 0.1,
            absolute_max_damage: 20.0,
            absolute_min_damage: 0.0,
            player_max_size: defaults.player_max_size,
            player_min_size: defaults.player_min_size,
            player_max_speed: defaults.player_max_speed,
            player_min_speed: defaults.player_min_speed,
            player_max_damage: defaults.player_max_damage,
            player_min_damage: defaults.player_min_damage,
            expand_cost: defaults.expand_cost,
            shrink_cost: defaults.shrink_cost,
            speed_up_cost: defaults.speed_up_cost,
            speed_down_cost: defaults.speed_down_cost,
            damage_up_cost: defaults.damage_up_cost,
            damage_down_cost: defaults.damage_down_cost,
            upgrade_step_size: defaults.upgrade_step_size,
            upgrade_step_speed: defaults.upgrade_step_speed,
            upgrade_step_damage: defaults.upgrade_step_damage,
            price_scalar_size: 1.0,
            price_scalar_speed: 1.0,
            price_scalar_damage: 1.0,
            total_expansions: 0,
            total_shrinks: 0,
            total_speed_ups: 0,
            total_speed_downs: 0,
            total_damage_ups: 0,
            total_damage_downs: 0,
            total_spent: 0.0,
            total_earned: 0.0,
            created_at: now,
            last_modified: now,
            last_expansion: 0,
            last_shrink: 0,
            item_prices: IndexMap::new(),
        };
        // Defaults pass through the clamping setters so a bad policy cannot
        // seed out-of-bounds state.
        state.set_player_max_size(defaults.player_max_size, now);
        state.set_player_min_size(defaults.player_min_size, now);
        state.set_player_max_speed(defaults.player_max_speed, now);
        state.set_player_min_speed(defaults.player_min_speed, now);
        state.set_player_max_damage(defaults.player_max_damage, now);
        state.set_player_min_damage(defaults.player_min_damage, now);
        state.set_size(defaults.size, now);
        state.set_speed(defaults.speed, now);
        state.set_damage(defaults.damage, now);
        state
    }

    fn touch(&mut self, now: EpochMs) {
        self.last_modified = now;
    }

    // ----- getters -----

    pub fn world(&self) -> &WorldId {
        &self.world
    }
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
    pub fn is_upgradable(&self) -> bool {
        self.upgradable
    }
    pub fn is_shop_enabled(&self) -> bool {
        self.shop_enabled
    }
    pub fn size(&self) -> f64 {
        self.size
    }
    pub fn speed(&self) -> f64 {
        self.speed
    }
    pub fn damage(&self) -> f64 {
        self.damage
    }
    pub fn warning_distance(&self) -> f64 {
        self.warning_distance
    }
    pub fn damage_buffer(&self) -> f64 {
        self.damage_buffer
    }
    pub fn absolute_max_size(&self) -> f64 {
        self.absolute_max_size
    }
    pub fn absolute_min_size(&self) -> f64 {
        self.absolute_min_size
    }
    pub fn absolute_max_speed(&self) -> f64 {
        self.absolute_max_speed
    }
    pub fn absolute_min_speed(&self) -> f64 {
        self.absolute_min_speed
    }
    pub fn absolute_max_damage(&self) -> f64 {
        self.absolute_max_damage
    }
    pub fn absolute_min_damage(&self) -> f64 {
        self.absolute_min_damage
    }
    pub fn player_max_size(&self) -> f64 {
        self.player_max_size
    }
    pub fn player_min_size(&self) -> f64 {
        self.player_min_size
    }
    pub fn player_max_speed(&self) -> f64 {
        self.player_max_speed
    }
    pub fn player_min_speed(&self) -> f64 {
        self.player_min_speed
    }
    pub fn player_max_damage(&self) -> f64 {
        self.player_max_damage
    }
    pub fn player_min_damage(&self) -> f64 {
        self.player_min_damage
    }
    pub fn upgrade_step_size(&self) -> f64 {
        self.upgrade_step_size
    }
    pub fn upgrade_step_speed(&self) -> f64 {
        self.upgrade_step_speed
    }
    pub fn upgrade_step_damage(&self) -> f64 {
        self.upgrade_step_damage
    }
    pub fn price_scalar_size(&self) -> f64 {
        self.price_scalar_size
    }
    pub fn price_scalar_speed(&self) -> f64 {
        self.price_scalar_speed
    }
    pub fn price_scalar_damage(&self) -> f64 {
        self.price_scalar_damage
    }
    pub fn total_expansions(&self) -> u32 {
        self.total_expansions
    }
    pub fn total_shrinks(&self) -> u32 {
        self.total_shrinks
    }
    pub fn total_speed_ups(&self) -> u32 {
        self.total_speed_ups
    }
    pub fn total_speed_downs(&self) -> u32 {
        self.total_speed_downs
    }
    pub fn total_damage_ups(&self) -> u32 {
        self.total_damage_ups
    }
    pub fn total_damage_downs(&self) -> u32 {
        self.total_damage_downs
    }
    pub fn total_spent(&self) -> f64 {
        self.total_spent
    }
    pub fn total_earned(&self) -> f64 {
        self.total_earned
    }
    pub fn created_at(&self) -> EpochMs {
        self.created_at
    }
    pub fn last_modified(&self) -> EpochMs {
        self.last_modified
    }
    pub fn last_expansion(&self) -> EpochMs {
        self.last_expansion
    }
    pub fn last_shrink(&self) -> EpochMs {
        self.last_shrink
    }
    pub fn item_price(&self, item: &str) -> Option<f64> {
        self.item_prices.get(&item.to_uppercase()).copied()
    }
    pub fn item_prices(&self) -> &IndexMap<String, f64> {
        &self.item_prices
    }

    // ----- flag setters -----

    pub fn set_enabled(&mut self, enabled: bool, now: EpochMs) {
        self.enabled = enabled;
        self.touch(now);
    }

    pub fn set_upgradable(&mut self, upgradable: bool, now: EpochMs) {
        self.upgradable = upgradable;
        self.touch(now);
    }

    pub fn set_shop_enabled(&mut self, shop_enabled: bool, now: EpochMs) {
        self.shop_enabled = shop_enabled;
        self.touch(now);
    }

    // ----- live value setters, clamped into the absolute bounds -----

    pub fn set_size(&mut self, size: f64, now: EpochMs) {
        self.size = size.clamp(self.absolute_min_size, self.absolute_max_size);
        self.touch(now);
    }

    pub fn set_speed(&mut self, speed: f64, now: EpochMs) {
        self.speed = speed.clamp(self.absolute_min_speed, self.absolute_max_speed);
        self.touch(now);
    }

    pub fn set_damage(&mut self, damage: f64, now: EpochMs) {
        self.damage = damage.clamp(self.absolute_min_damage, self.absolute_max_damage);
        self.touch(now);
    }

    pub fn set_warning_distance(&mut self, distance: f64, now: EpochMs) {
        self.warning_distance = distance.clamp(1.0, 100.0);
        self.touch(now);
    }

    pub fn set_damage_buffer(&mut self, buffer: f64, now: EpochMs) {
        self.damage_buffer = buffer.clamp(0.0, 50.0);
        self.touch(now);
    }

    // ----- absolute bound setters, pulling dependent values inward -----

    pub fn set_absolute_max_size(&mut self, value: f64, now: EpochMs) {
        self.absolute_max_size = clamp(value, ADMIN_MAX_SIZE_RANGE);
        if self.player_max_size > self.absolute_max_size {
            self.player_max_size = self.absolute_max_size;
        }
        if self.size > self.absolute_max_size {
            self.size = self.absolute_max_size;
        }
        self.touch(now);
    }

    pub fn set_absolute_min_size(&mut self, value: f64, now: EpochMs) {
        self.absolute_min_size = clamp(value, ADMIN_MIN_SIZE_RANGE);
        if self.player_min_size < self.absolute_min_size {
            self.player_min_size = self.absolute_min_size;
        }
        if self.size < self.absolute_min_size {
            self.size = self.absolute_min_size;
        }
        self.touch(now);
    }

    pub fn set_absolute_max_speed(&mut self, value: f64, now: EpochMs) {
        self.absolute_max_speed = clamp(value, ADMIN_MAX_SPEED_RANGE);
        if self.player_max_speed > self.absolute_max_speed {
            self.player_max_speed = self.absolute_max_speed;
        }
        if self.speed > self.absolute_max_speed {
            self.speed = self.absolute_max_speed;
        }
        self.touch(now);
    }

    pub fn set_absolute_min_speed(&mut self, value: f64, now: EpochMs) {
        self.absolute_min_speed = clamp(value, ADMIN_MIN_SPEED_RANGE);
        if self.player_min_speed < self.absolute_min_speed {
            self.player_min_speed = self.absolute_min_speed;
        }
        if self.speed < self.absolute_min_speed {
            self.speed = self.absolute_min_speed;
        }
        self.touch(now);
    }

    pub fn set_absolute_max_damage(&mut self, value: f64, now: EpochMs) {
        self.absolute_max_damage = clamp(value, ADMIN_MAX_DAMAGE_RANGE);
        if self.player_max_damage > self.absolute_max_damage {
            self.player_max_damage = self.absolute_max_damage;
        }
        if self.damage > self.absolute_max_damage {
            self.damage = self.absolute_max_damage;
        }
        self.touch(now);
    }

    pub fn set_absolute_min_damage(&mut self, value: f64, now: EpochMs) {
        self.absolute_min_damage = clamp(value, ADMIN_MIN_DAMAGE_RANGE);
        if self.player_min_damage < self.absolute_min_damage {
            self.player_min_damage = self.absolute_min_damage;
        }
        if self.damage < self.absolute_min_damage {
            self.damage = self.absolute_min_damage;
        }
        self.touch(now);
    }

    // ----- player bound setters, clamped into the absolute range -----

    pub fn set_player_max_size(&mut self, value: f64, now: EpochMs) {
        self.player_max_size = value.clamp(self.absolute_min_size, self.absolute_max_size);
        self.touch(now);
    }

    pub fn set_player_min_size(&mut self, value: f64, now: EpochMs) {
        self.player_min_size = value.clamp(self.absolute_min_size, self.absolute_max_size);
        self.touch(now);
    }

    pub fn set_player_max_speed(&mut self, value: f64, now: EpochMs) {
        self.player_max_speed = value.clamp(self.absolute_min_speed, self.absolute_max_speed);
        self.touch(now);
    }

    pub fn set_player_min_speed(&mut self, value: f64, now: EpochMs) {
        self.player_min_speed = value.clamp(self.absolute_min_speed, self.absolute_max_speed);
        self.touch(now);
    }

    pub fn set_player_max_damage(&mut self, value: f64, now: EpochMs) {
        self.player_max_damage = value.clamp(self.absolute_min_damage, self.absolute_max_damage);
        self.touch(now);
    }

    pub fn set_player_min_damage(&mut self, value: f64, now: EpochMs) {
        self.player_min_damage = value.clamp(self.absolute_min_damage, self.absolute_max_damage);
        self.touch(now);
    }

    // ----- price base, step, and scalar setters -----

    pub fn set_base_cost(&mut self, price_type: PriceType, value: f64, now: EpochMs) {
        let value = clamp(value, COST_RANGE);
        match price_type {
            PriceType::Expand => self.expand_cost = value,
            PriceType::Shrink => self.shrink_cost = value,
            PriceType::SpeedUp => self.speed_up_cost = value,
            PriceType::SpeedDown => self.speed_down_cost = value,
            PriceType::DamageUp => self.damage_up_cost = value,
            PriceType::DamageDown => self.damage_down_cost = value,
        }
        self.touch(now);
    }

    pub fn base_cost(&self, price_type: PriceType) -> f64 {
        match price_type {
            PriceType::Expand => self.expand_cost,
            PriceType::Shrink => self.shrink_cost,
            PriceType::SpeedUp => self.speed_up_cost,
            PriceType::SpeedDown => self.speed_down_cost,
            PriceType::DamageUp => self.damage_up_cost,
            PriceType::DamageDown => self.damage_down_cost,
        }
    }

    pub fn set_upgrade_step_size(&mut self, value: f64, now: EpochMs) {
        self.upgrade_step_size = clamp(value, STEP_SIZE_RANGE);
        self.touch(now);
    }

    pub fn set_upgrade_step_speed(&mut self, value: f64, now: EpochMs) {
        self.upgrade_step_speed = clamp(value, STEP_FINE_RANGE);
        self.touch(now);
    }

    pub fn set_upgrade_step_damage(&mut self, value: f64, now: EpochMs) {
        self.upgrade_step_damage = clamp(value, STEP_FINE_RANGE);
        self.touch(now);
    }

    pub fn set_price_scalar_size(&mut self, value: f64, now: EpochMs) {
        self.price_scalar_size = clamp(value, SCALAR_RANGE);
        self.touch(now);
    }

    pub fn set_price_scalar_speed(&mut self, value: f64, now: EpochMs) {
        self.price_scalar_speed = clamp(value, SCALAR_RANGE);
        self.touch(now);
    }

    pub fn set_price_scalar_damage(&mut self, value: f64, now: EpochMs) {
        self.price_scalar_damage = clamp(value, SCALAR_RANGE);
        self.touch(now);
    }

    // ----- purchase validation -----

    /// Check that growing by `blocks` stays within both bound sets
    pub fn can_expand(&self, blocks: f64) -> bool {
        let new_size = self.size + blocks;
        new_size <= self.player_max_size && new_size <= self.absolute_max_size
    }

    /// Check that contracting by `blocks` stays within both bound sets
    pub fn can_shrink(&self, blocks: f64) -> bool {
        let new_size = self.size - blocks;
        new_size >= self.player_min_size && new_size >= self.absolute_min_size
    }

    /// Check that one speed step in the given direction stays in bounds
    pub fn can_adjust_speed(&self, up: bool) -> bool {
        if up {
            let new_speed = self.speed + self.upgrade_step_speed;
            new_speed <= self.player_max_speed && new_speed <= self.absolute_max_speed
        } else {
            let new_speed = self.speed - self.upgrade_step_speed;
            new_speed >= self.player_min_speed && new_speed >= self.absolute_min_speed
        }
    }

    /// Check that one damage step in the given direction stays in bounds.
    /// `down` lowers the damage (the upgrade players usually want).
    pub fn can_adjust_damage(&self, down: bool) -> bool {
        if down {
            let new_damage = self.damage - self.upgrade_step_damage;
            new_damage >= self.player_min_damage && new_damage >= self.absolute_min_damage
        } else {
            let new_damage = self.damage + self.upgrade_step_damage;
            new_damage <= self.player_max_damage && new_damage <= self.absolute_max_damage
        }
    }

    // ----- base cost helpers (before the progressive multiplier) -----

    pub fn expand_cost_for(&self, blocks: f64) -> f64 {
        self.expand_cost * blocks * self.price_scalar_size
    }

    pub fn shrink_cost_for(&self, blocks: f64) -> f64 {
        self.shrink_cost * blocks * self.price_scalar_size
    }

    pub fn speed_adjust_cost(&self, up: bool) -> f64 {
        (if up { self.speed_up_cost } else { self.speed_down_cost }) * self.price_scalar_speed
    }

    pub fn damage_adjust_cost(&self, down: bool) -> f64 {
        (if down { self.damage_down_cost } else { self.damage_up_cost }) * self.price_scalar_damage
    }

    // ----- counters -----

    /// Record a successful purchase of the given kind
    pub fn record_purchase(&mut self, price_type: PriceType, now: EpochMs) {
        match price_type {
            PriceType::Expand => {
                self.total_expansions += 1;
                self.last_expansion = now;
            }
            PriceType::Shrink => {
                self.total_shrinks += 1;
                self.last_shrink = now;
            }
            PriceType::SpeedUp => self.total_speed_ups += 1,
            PriceType::SpeedDown => self.total_speed_downs += 1,
            PriceType::DamageUp => self.total_damage_ups += 1,
            PriceType::DamageDown => self.total_damage_downs += 1,
        }
        self.touch(now);
    }

    pub fn add_spent(&mut self, amount: f64, now: EpochMs) {
        self.total_spent += amount;
        self.touch(now);
    }

    pub fn add_earned(&mut self, amount: f64, now: EpochMs) {
        self.total_earned += amount;
        self.touch(now);
    }

    // ----- sell-shop item prices -----

    pub fn set_item_price(&mut self, item: &str, price: f64, now: EpochMs) {
        self.item_prices.insert(item.to_uppercase(), price.max(0.01));
        self.touch(now);
    }

    pub fn remove_item_price(&mut self, item: &str, now: EpochMs) -> bool {
        let removed = self.item_prices.shift_remove(&item.to_uppercase()).is_some();
        if removed {
            self.touch(now);
        }
        removed
    }

    // ----- persistence record conversion -----

    /// Flatten to the gateway record shape
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("worldName".into(), self.world.as_str().into());
        record.insert("enabled".into(), self.enabled.into());
        record.insert("upgradable".into(), self.upgradable.into());
        record.insert("shopEnabled".into(), self.shop_enabled.into());

        record.insert("currentSize".into(), self.size.into());
        record.insert("currentSpeed".into(), self.speed.into());
        record.insert("currentDamage".into(), self.damage.into());
        record.insert("warningDistance".into(), self.warning_distance.into());
        record.insert("damageBuffer".into(), self.damage_buffer.into());

        record.insert("absoluteMaxSize".into(), self.absolute_max_size.into());
        record.insert("absoluteMinSize".into(), self.absolute_min_size.into());
        record.insert("absoluteMaxSpeed".into(), self.absolute_max_speed.into());
        record.insert("absoluteMinSpeed".into(), self.absolute_min_speed.into());
        record.insert("absoluteMaxDamage".into(), self.absolute_max_damage.into());
        record.insert("absoluteMinDamage".into(), self.absolute_min_damage.into());

        record.insert("playerMaxSize".into(), self.player_max_size.into());
        record.insert("playerMinSize".into(), self.player_min_size.into());
        record.insert("playerMaxSpeed".into(), self.player_max_speed.into());
        record.insert("playerMinSpeed".into(), self.player_min_speed.into());
        record.insert("playerMaxDamage".into(), self.player_max_damage.into());
        record.insert("playerMinDamage".into(), self.player_min_damage.into());

        record.insert("expandCost".into(), self.expand_cost.into());
        record.insert("shrinkCost".into(), self.shrink_cost.into());
        record.insert("speedUpCost".into(), self.speed_up_cost.into());
        record.insert("speedDownCost".into(), self.speed_down_cost.into());
        record.insert("damageUpCost".into(), self.damage_up_cost.into());
        record.insert("damageDownCost".into(), self.damage_down_cost.into());

        record.insert("upgradeStepSize".into(), self.upgrade_step_size.into());
        record.insert("upgradeStepSpeed".into(), self.upgrade_step_speed.into());
        record.insert("upgradeStepDamage".into(), self.upgrade_step_damage.into());

        record.insert("priceScalarSize".into(), self.price_scalar_size.into());
        record.insert("priceScalarSpeed".into(), self.price_scalar_speed.into());
        record.insert("priceScalarDamage".into(), self.price_scalar_damage.into());

        record.insert("totalExpansions".into(), self.total_expansions.into());
        record.insert("totalShrinks".into(), self.total_shrinks.into());
        record.insert("totalSpeedUps".into(), self.total_speed_ups.into());
        record.insert("totalSpeedDowns".into(), self.total_speed_downs.into());
        record.insert("totalDamageUps".into(), self.total_damage_ups.into());
        record.insert("totalDamageDowns".into(), self.total_damage_downs.into());
        record.insert("totalSpent".into(), self.total_spent.into());
        record.insert("totalEarned".into(), self.total_earned.into());

        record.insert("createdAt".into(), self.created_at.into());
        record.insert("lastModified".into(), self.last_modified.into());
        record.insert("lastExpansion".into(), self.last_expansion.into());
        record.insert("lastShrink".into(), self.last_shrink.into());

        let mut items = ValueMap::new();
        for (item, price) in &self.item_prices {
            items.insert(item.clone(), (*price).into());
        }
        record.insert("itemPrices".into(), items.into());

        record
    }

    /// Rebuild from a gateway record; missing fields fall back to defaults
    pub fn from_record(world: WorldId, record: &Record, now: EpochMs) -> Self {
        let mut state = Self::new(world, now);
        state.enabled = record_bool(record, "enabled", true);
        state.upgradable = record_bool(record, "upgradable", true);
        state.shop_enabled = record_bool(record, "shopEnabled", true);

        state.absolute_max_size = record_float(record, "absoluteMaxSize", 30_000.0);
        state.absolute_min_size = record_float(record, "absoluteMinSize", 50.0);
        state.absolute_max_speed = record_float(record, "absoluteMaxSpeed", 10.0);
        state.absolute_min_speed = record_float(record, "absoluteMinSpeed", 0.1);
        state.absolute_max_damage = record_float(record, "absoluteMaxDamage", 20.0);
        state.absolute_min_damage = record_float(record, "absoluteMinDamage", 0.0);

        state.player_max_size = record_float(record, "playerMaxSize", 30_000.0);
        state.player_min_size = record_float(record, "playerMinSize", 50.0);
        state.player_max_speed = record_float(record, "playerMaxSpeed", 5.0);
        state.player_min_speed = record_float(record, "playerMinSpeed", 0.5);
        state.player_max_damage = record_float(record, "playerMaxDamage", 10.0);
        state.player_min_damage = record_float(record, "playerMinDamage", 0.5);

        state.size = record_float(record, "currentSize", 1000.0)
            .clamp(state.absolute_min_size, state.absolute_max_size);
        state.speed = record_float(record, "currentSpeed", 1.0)
            .clamp(state.absolute_min_speed, state.absolute_max_speed);
        state.damage = record_float(record, "currentDamage", 2.0)
            .clamp(state.absolute_min_damage, state.absolute_max_damage);
        state.warning_distance = record_float(record, "warningDistance", 10.0);
        state.damage_buffer = record_float(record, "damageBuffer", 5.0);

        state.expand_cost = record_float(record, "expandCost", 1.0);
        state.shrink_cost = record_float(record, "shrinkCost", 0.5);
        state.speed_up_cost = record_float(record, "speedUpCost", 15.0);
        state.speed_down_cost = record_float(record, "speedDownCost", 5.0);
        state.damage_up_cost = record_float(record, "damageUpCost", 8.0);
        state.damage_down_cost = record_float(record, "damageDownCost", 12.0);

        state.upgrade_step_size = record_float(record, "upgradeStepSize", 1.0);
        state.upgrade_step_speed = record_float(record, "upgradeStepSpeed", 0.1);
        state.upgrade_step_damage = record_float(record, "upgradeStepDamage", 0.1);

        state.price_scalar_size = record_float(record, "priceScalarSize", 1.0);
        state.price_scalar_speed = record_float(record, "priceScalarSpeed", 1.0);
        state.price_scalar_damage = record_float(record, "priceScalarDamage", 1.0);

        state.total_expansions = record_int(record, "totalExpansions", 0) as u32;
        state.total_shrinks = record_int(record, "totalShrinks", 0) as u32;
        state.total_speed_ups = record_int(record, "totalSpeedUps", 0) as u32;
        state.total_speed_downs = record_int(record, "totalSpeedDowns", 0) as u32;
        state.total_damage_ups = record_int(record, "totalDamageUps", 0) as u32;
        state.total_damage_downs = record_int(record, "totalDamageDowns", 0) as u32;
        state.total_spent = record_float(record, "totalSpent", 0.0);
        state.total_earned = record_float(record, "totalEarned", 0.0);

        state.created_at = record_int(record, "createdAt", now);
        state.last_modified = record_int(record, "lastModified", now);
        state.last_expansion = record_int(record, "lastExpansion", 0);
        state.last_shrink = record_int(record, "lastShrink", 0);

        if let Some(items) = record.get("itemPrices").and_then(|v| v.as_map()) {
            for (item, price) in items {
                if let Some(price) = price.as_float() {
                    state.item_prices.insert(item.clone(), price);
                }
            }
        }

        state
    }
}

/// Keyed collection owning one border state per world
#[derive(Debug, Clone, Default)]
pub struct BorderStore {
    worlds: IndexMap<WorldId, BorderState>,
}

impl BorderStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a world's border state
    pub fn get(&self, world: &WorldId) -> Option<&BorderState> {
        self.worlds.get(world)
    }

    /// Get a world's border state mutably
    pub fn get_mut(&mut self, world: &WorldId) -> Option<&mut BorderState> {
        self.worlds.get_mut(world)
    }

    /// Get a world's border state, creating it from defaults on first reference
    pub fn get_or_create(
        &mut self,
        world: &WorldId,
        defaults: &WorldDefaults,
        now: EpochMs,
    ) -> &mut BorderState {
        self.worlds
            .entry(world.clone())
            .or_insert_with(|| BorderState::with_defaults(world.clone(), defaults, now))
    }

    /// Insert border state loaded from persistence
    pub fn insert(&mut self, state: BorderState) {
        self.worlds.insert(state.world().clone(), state);
    }

    /// Iterate all border states
    pub fn iter(&self) -> impl Iterator<Item = &BorderState> {
        self.worlds.values()
    }

    /// All known world IDs
    pub fn world_ids(&self) -> impl Iterator<Item = &WorldId> {
        self.worlds.keys()
    }

    /// Number of worlds with border state
    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> BorderState {
        BorderState::new(WorldId::new("overworld"), 1_000)
    }

    #[test]
    fn test_size_clamps_into_absolute_bounds() {
        let mut s = state();
        s.set_size(100_000.0, 2_000);
        assert_eq!(s.size(), s.absolute_max_size());

        s.set_size(1.0, 3_000);
        assert_eq!(s.size(), s.absolute_min_size());
        assert_eq!(s.last_modified(), 3_000);
    }

    #[test]
    fn test_absolute_max_pulls_dependents_inward() {
        let mut s = state();
        s.set_size(5_000.0, 2_000);
        s.set_player_max_size(10_000.0, 2_000);

        s.set_absolute_max_size(2_000.0, 3_000);
        assert_eq!(s.absolute_max_size(), 2_000.0);
        assert_eq!(s.player_max_size(), 2_000.0);
        assert_eq!(s.size(), 2_000.0);
    }

    #[test]
    fn test_absolute_min_pulls_dependents_inward() {
        let mut s = state();
        s.set_absolute_min_size(200.0, 2_000);
        assert_eq!(s.player_min_size(), 200.0);

        s.set_size(100.0, 3_000);
        assert_eq!(s.size(), 200.0);
    }

    #[test]
    fn test_player_bounds_clamp_into_absolute_range() {
        let mut s = state();
        s.set_player_max_size(1_000_000.0, 2_000);
        assert_eq!(s.player_max_size(), s.absolute_max_size());

        s.set_player_min_size(0.5, 2_000);
        assert_eq!(s.player_min_size(), s.absolute_min_size());
    }

    #[test]
    fn test_can_expand_and_shrink() {
        let s = state();
        assert!(s.can_expand(100.0));
        assert!(!s.can_expand(40_000.0));
        assert!(s.can_shrink(900.0));
        assert!(!s.can_shrink(960.0)); // below player min of 50
    }

    #[test]
    fn test_speed_and_damage_steps() {
        let mut s = state();
        assert!(s.can_adjust_speed(true));
        s.set_speed(5.0, 2_000); // player max
        assert!(!s.can_adjust_speed(true));

        s.set_damage(0.5, 2_000); // player min
        assert!(!s.can_adjust_damage(true));
        assert!(s.can_adjust_damage(false));
    }

    #[test]
    fn test_cost_helpers_apply_scalar() {
        let mut s = state();
        assert_eq!(s.expand_cost_for(100.0), 100.0);

        s.set_price_scalar_size(2.0, 2_000);
        assert_eq!(s.expand_cost_for(100.0), 200.0);
        assert_eq!(s.shrink_cost_for(100.0), 100.0);
        assert_eq!(s.speed_adjust_cost(true), 15.0);
        assert_eq!(s.damage_adjust_cost(true), 12.0);
        assert_eq!(s.damage_adjust_cost(false), 8.0);
    }

    #[test]
    fn test_record_purchase_counters() {
        let mut s = state();
        s.record_purchase(PriceType::Expand, 5_000);
        s.record_purchase(PriceType::Expand, 6_000);
        s.record_purchase(PriceType::SpeedUp, 7_000);

        assert_eq!(s.total_expansions(), 2);
        assert_eq!(s.total_speed_ups(), 1);
        assert_eq!(s.last_expansion(), 6_000);
    }

    #[test]
    fn test_item_prices_uppercase_keys() {
        let mut s = state();
        s.set_item_price("diamond", 64.0, 2_000);
        assert_eq!(s.item_price("DIAMOND"), Some(64.0));
        assert_eq!(s.item_price("Diamond"), Some(64.0));

        assert!(s.remove_item_price("diamond", 3_000));
        assert!(!s.remove_item_price("diamond", 3_000));
    }

    #[test]
    fn test_record_round_trip() {
        let mut s = state();
        s.set_size(2_500.0, 2_000);
        s.set_player_max_speed(3.0, 2_000);
        s.set_item_price("gold", 9.0, 2_000);
        s.record_purchase(PriceType::Expand, 3_000);
        s.add_spent(125.0, 3_000);

        let record = s.to_record();
        let restored = BorderState::from_record(WorldId::new("overworld"), &record, 9_000);

        assert_eq!(restored.size(), 2_500.0);
        assert_eq!(restored.player_max_speed(), 3.0);
        assert_eq!(restored.item_price("GOLD"), Some(9.0));
        assert_eq!(restored.total_expansions(), 1);
        assert_eq!(restored.total_spent(), 125.0);
        assert_eq!(restored.created_at(), s.created_at());
    }

    #[test]
    fn test_world_defaults_ron() {
        let ron_str = r#"
        (
            size: 2000.0,
            upgradable: false,
            expand_cost: 2.0,
        )
        "#;

        let defaults: WorldDefaults = ron::from_str(ron_str).unwrap();
        assert_eq!(defaults.size, 2000.0);
        assert!(!defaults.upgradable);
        assert_eq!(defaults.expand_cost, 2.0);
        // Omitted fields fall back to the built-in defaults
        assert_eq!(defaults.speed, 1.0);
        assert!(defaults.enabled);

        let state = BorderState::with_defaults(WorldId::new("overworld"), &defaults, 1_000);
        assert_eq!(state.size(), 2000.0);
        assert!(!state.is_upgradable());
    }

    #[test]
    fn test_store_get_or_create() {
        let mut store = BorderStore::new();
        let defaults = WorldDefaults::default();
        let world = WorldId::new("overworld");

        assert!(store.get(&world).is_none());
        store.get_or_create(&world, &defaults, 1_000);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&world).unwrap().size(), 1000.0);

        // Second reference returns the same record
        store.get_mut(&world).unwrap().set_size(1_500.0, 2_000);
        let again = store.get_or_create(&world, &defaults, 3_000);
        assert_eq!(again.size(), 1_500.0);
    }
}
