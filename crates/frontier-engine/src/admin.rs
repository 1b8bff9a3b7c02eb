//! Administrative operations
//!
//! Admin edits bypass pricing and payment entirely: validate, apply with
//! the same clamp invariants, persist. They return errors instead of
//! purchase outcomes because they are driven by a command surface, not by
//! paying players.

use crate::engine::BorderEconomy;
use crate::error::{Error, Result};
use frontier_core::{
    progression_key, FormulaKind, MultiplierConfig, PlayerId, PriceType, ResetSchedule, WorldId,
    WorldProgressStats,
};
use tracing::warn;

/// Which live metric an admin limit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Size,
    Speed,
    Damage,
}

/// Which end of a limit range is being set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
}

// Hard ranges an administrator may place absolute limits in.
const SIZE_RANGE: (f64, f64) = (1.0, 1_000_000.0);
const SPEED_RANGE: (f64, f64) = (0.01, 100.0);
const DAMAGE_RANGE: (f64, f64) = (0.0, 500.0);

impl BorderEconomy {
    fn require_world(&mut self, world: &WorldId) -> Result<()> {
        if self.borders.get(world).is_none() {
            return Err(Error::UnknownWorld(world.to_string()));
        }
        Ok(())
    }

    /// Set an absolute bound for a world. Returns the applied value.
    pub fn set_absolute_limit(
        &mut self,
        world: &WorldId,
        metric: Metric,
        bound: Bound,
        value: f64,
    ) -> Result<f64> {
        self.require_world(world)?;
        let range = match metric {
            Metric::Size => SIZE_RANGE,
            Metric::Speed => SPEED_RANGE,
            Metric::Damage => DAMAGE_RANGE,
        };
        if value < range.0 || value > range.1 {
            return Err(Error::OutOfRange(format!(
                "{:.2} outside [{:.2}, {:.2}]",
                value, range.0, range.1
            )));
        }

        let now = self.now_ms();
        let border = self
            .borders
            .get_mut(world)
            .ok_or_else(|| Error::UnknownWorld(world.to_string()))?;
        let applied = match (metric, bound) {
            (Metric::Size, Bound::Max) => {
                border.set_absolute_max_size(value, now);
                border.absolute_max_size()
            }
            (Metric::Size, Bound::Min) => {
                border.set_absolute_min_size(value, now);
                border.absolute_min_size()
            }
            (Metric::Speed, Bound::Max) => {
                border.set_absolute_max_speed(value, now);
                border.absolute_max_speed()
            }
            (Metric::Speed, Bound::Min) => {
                border.set_absolute_min_speed(value, now);
                border.absolute_min_speed()
            }
            (Metric::Damage, Bound::Max) => {
                border.set_absolute_max_damage(value, now);
                border.absolute_max_damage()
            }
            (Metric::Damage, Bound::Min) => {
                border.set_absolute_min_damage(value, now);
                border.absolute_min_damage()
            }
        };
        self.persist_border(world);
        Ok(applied)
    }

    /// Set a player-facing bound for a world. The value must already lie
    /// within the world's absolute range. Returns the applied value.
    pub fn set_player_limit(
        &mut self,
        world: &WorldId,
        metric: Metric,
        bound: Bound,
        value: f64,
    ) -> Result<f64> {
        let now = self.now_ms();
        let border = self
            .borders
            .get_mut(world)
            .ok_or_else(|| Error::UnknownWorld(world.to_string()))?;
        let (abs_min, abs_max) = match metric {
            Metric::Size => (border.absolute_min_size(), border.absolute_max_size()),
            Metric::Speed => (border.absolute_min_speed(), border.absolute_max_speed()),
            Metric::Damage => (border.absolute_min_damage(), border.absolute_max_damage()),
        };
        if value < abs_min || value > abs_max {
            return Err(Error::OutOfRange(format!(
                "{:.2} outside absolute range [{:.2}, {:.2}]",
                value, abs_min, abs_max
            )));
        }

        let applied = match (metric, bound) {
            (Metric::Size, Bound::Max) => {
                border.set_player_max_size(value, now);
                border.player_max_size()
            }
            (Metric::Size, Bound::Min) => {
                border.set_player_min_size(value, now);
                border.player_min_size()
            }
            (Metric::Speed, Bound::Max) => {
                border.set_player_max_speed(value, now);
                border.player_max_speed()
            }
            (Metric::Speed, Bound::Min) => {
                border.set_player_min_speed(value, now);
                border.player_min_speed()
            }
            (Metric::Damage, Bound::Max) => {
                border.set_player_max_damage(value, now);
                border.player_max_damage()
            }
            (Metric::Damage, Bound::Min) => {
                border.set_player_min_damage(value, now);
                border.player_min_damage()
            }
        };
        self.persist_border(world);
        Ok(applied)
    }

    /// Set a base cost for one price type. Returns the applied value.
    pub fn set_base_price(
        &mut self,
        world: &WorldId,
        price_type: PriceType,
        value: f64,
    ) -> Result<f64> {
        let now = self.now_ms();
        let border = self
            .borders
            .get_mut(world)
            .ok_or_else(|| Error::UnknownWorld(world.to_string()))?;
        border.set_base_cost(price_type, value, now);
        let applied = border.base_cost(price_type);
        self.persist_border(world);
        Ok(applied)
    }

    /// Set an upgrade step for a metric. Returns the applied value.
    pub fn set_upgrade_step(&mut self, world: &WorldId, metric: Metric, value: f64) -> Result<f64> {
        let now = self.now_ms();
        let border = self
            .borders
            .get_mut(world)
            .ok_or_else(|| Error::UnknownWorld(world.to_string()))?;
        let applied = match metric {
            Metric::Size => {
                border.set_upgrade_step_size(value, now);
                border.upgrade_step_size()
            }
            Metric::Speed => {
                border.set_upgrade_step_speed(value, now);
                border.upgrade_step_speed()
            }
            Metric::Damage => {
                border.set_upgrade_step_damage(value, now);
                border.upgrade_step_damage()
            }
        };
        self.persist_border(world);
        Ok(applied)
    }

    /// Set the static per-world price scalar for a metric
    pub fn set_price_scalar(&mut self, world: &WorldId, metric: Metric, value: f64) -> Result<f64> {
        let now = self.now_ms();
        let border = self
            .borders
            .get_mut(world)
            .ok_or_else(|| Error::UnknownWorld(world.to_string()))?;
        let applied = match metric {
            Metric::Size => {
                border.set_price_scalar_size(value, now);
                border.price_scalar_size()
            }
            Metric::Speed => {
                border.set_price_scalar_speed(value, now);
                border.price_scalar_speed()
            }
            Metric::Damage => {
                border.set_price_scalar_damage(value, now);
                border.price_scalar_damage()
            }
        };
        self.persist_border(world);
        Ok(applied)
    }

    /// Set how close to the border the warning effect starts
    pub fn set_warning_distance(&mut self, world: &WorldId, distance: f64) -> Result<f64> {
        let now = self.now_ms();
        let border = self
            .borders
            .get_mut(world)
            .ok_or_else(|| Error::UnknownWorld(world.to_string()))?;
        border.set_warning_distance(distance, now);
        let applied = border.warning_distance();
        self.persist_border(world);
        Ok(applied)
    }

    /// Set how far outside the border players may travel before damage
    pub fn set_damage_buffer(&mut self, world: &WorldId, buffer: f64) -> Result<f64> {
        let now = self.now_ms();
        let border = self
            .borders
            .get_mut(world)
            .ok_or_else(|| Error::UnknownWorld(world.to_string()))?;
        border.set_damage_buffer(buffer, now);
        let applied = border.damage_buffer();
        self.persist_border(world);
        Ok(applied)
    }

    /// Enable or disable the whole border system for a world
    pub fn set_enabled(&mut self, world: &WorldId, enabled: bool) -> Result<()> {
        let now = self.now_ms();
        let border = self
            .borders
            .get_mut(world)
            .ok_or_else(|| Error::UnknownWorld(world.to_string()))?;
        border.set_enabled(enabled, now);
        self.persist_border(world);
        Ok(())
    }

    /// Enable or disable speed/damage upgrades for a world
    pub fn set_upgradable(&mut self, world: &WorldId, upgradable: bool) -> Result<()> {
        let now = self.now_ms();
        let border = self
            .borders
            .get_mut(world)
            .ok_or_else(|| Error::UnknownWorld(world.to_string()))?;
        border.set_upgradable(upgradable, now);
        self.persist_border(world);
        Ok(())
    }

    /// Enable or disable the sell shop for a world
    pub fn set_shop_enabled(&mut self, world: &WorldId, shop_enabled: bool) -> Result<()> {
        let now = self.now_ms();
        let border = self
            .borders
            .get_mut(world)
            .ok_or_else(|| Error::UnknownWorld(world.to_string()))?;
        border.set_shop_enabled(shop_enabled, now);
        self.persist_border(world);
        Ok(())
    }

    /// List an item in the world's sell shop
    pub fn set_item_price(&mut self, world: &WorldId, item: &str, price: f64) -> Result<()> {
        let now = self.now_ms();
        let border = self
            .borders
            .get_mut(world)
            .ok_or_else(|| Error::UnknownWorld(world.to_string()))?;
        border.set_item_price(item, price, now);
        self.persist_border(world);
        Ok(())
    }

    /// Delist an item from the world's sell shop
    pub fn remove_item_price(&mut self, world: &WorldId, item: &str) -> Result<bool> {
        let now = self.now_ms();
        let border = self
            .borders
            .get_mut(world)
            .ok_or_else(|| Error::UnknownWorld(world.to_string()))?;
        let removed = border.remove_item_price(item, now);
        if removed {
            self.persist_border(world);
        }
        Ok(removed)
    }

    // ----- multiplier-config edits -----

    /// Install or replace a full multiplier config
    pub fn set_multiplier_config(&mut self, config: MultiplierConfig) {
        self.pricing.insert(config);
        self.persist_multipliers();
    }

    /// Set the formula kind for a price type, creating the config if absent
    pub fn set_multiplier_kind(&mut self, price_type: PriceType, kind: FormulaKind) {
        self.pricing.config_mut(price_type).set_kind(kind);
        self.persist_multipliers();
    }

    /// Set the base value for a price type's multiplier
    pub fn set_multiplier_base(&mut self, price_type: PriceType, value: f64) {
        self.pricing.config_mut(price_type).set_base_value(value);
        self.persist_multipliers();
    }

    /// Set the linear growth step for a price type's multiplier
    pub fn set_multiplier_step(&mut self, price_type: PriceType, step: f64) {
        self.pricing.config_mut(price_type).set_step(step);
        self.persist_multipliers();
    }

    /// Set the custom formula text for a price type's multiplier
    pub fn set_multiplier_formula(&mut self, price_type: PriceType, formula: impl Into<String>) {
        self.pricing
            .config_mut(price_type)
            .set_custom_formula(formula);
        self.persist_multipliers();
    }

    /// Set the clamp limits for a price type's multiplier
    pub fn set_multiplier_limits(&mut self, price_type: PriceType, min: f64, max: f64) {
        self.pricing.config_mut(price_type).set_limits(min, max);
        self.persist_multipliers();
    }

    /// Set the reset schedule for a price type's multiplier
    pub fn set_multiplier_schedule(&mut self, price_type: PriceType, schedule: ResetSchedule) {
        self.pricing
            .config_mut(price_type)
            .set_reset_schedule(schedule);
        self.persist_multipliers();
    }

    /// Enable or disable a price type's multiplier
    pub fn set_multiplier_enabled(&mut self, price_type: PriceType, enabled: bool) {
        self.pricing.config_mut(price_type).set_enabled(enabled);
        self.persist_multipliers();
    }

    /// Simulate the multiplier sequence for levels 0..n, if configured
    pub fn simulate_multipliers(&self, price_type: PriceType, levels: u32) -> Option<Vec<f64>> {
        self.pricing
            .config(price_type)
            .map(|config| config.simulate(levels))
    }

    // ----- progression admin -----

    /// Reset one player's progression for one price type
    pub fn reset_progress(
        &mut self,
        player: PlayerId,
        world: &WorldId,
        price_type: PriceType,
    ) -> bool {
        let now = self.now_ms();
        let reset = self.progressions.reset(player, world, price_type, now);
        if reset {
            self.flush_progression(player);
        }
        reset
    }

    /// Reset every progression a player holds in one world
    pub fn reset_world_progress(&mut self, player: PlayerId, world: &WorldId) -> bool {
        let now = self.now_ms();
        let reset = self.progressions.reset_all_for_world(player, world, now);
        if reset {
            self.flush_progression(player);
        }
        reset
    }

    /// Aggregate level/spend summary for a player's world
    pub fn player_stats(&self, player: PlayerId, world: &WorldId) -> WorldProgressStats {
        self.progressions.stats_for_world(player, world)
    }

    fn flush_progression(&mut self, player: PlayerId) {
        if let Err(err) = self.progressions.flush(player, self.gateway.as_ref()) {
            warn!(key = progression_key(player), %err, "failed to persist progression");
        }
    }
}
