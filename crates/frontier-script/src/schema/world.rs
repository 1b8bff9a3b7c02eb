//! World-defaults schema
//!
//! The `defaults` block seeds border state for worlds seen for the first
//! time. Every field is optional; omitted fields fall back to the built-in
//! defaults.

use frontier_core::WorldDefaults;
use serde::{Deserialize, Serialize};

/// A min/max pair for one player limit
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LimitPair {
    pub min: f64,
    pub max: f64,
}

/// Player limits per metric
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LimitsDef {
    #[serde(default)]
    pub size: Option<LimitPair>,
    #[serde(default)]
    pub speed: Option<LimitPair>,
    #[serde(default)]
    pub damage: Option<LimitPair>,
}

/// Base costs per purchase operation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CostsDef {
    #[serde(default)]
    pub expand: Option<f64>,
    #[serde(default)]
    pub shrink: Option<f64>,
    #[serde(default)]
    pub speed_up: Option<f64>,
    #[serde(default)]
    pub speed_down: Option<f64>,
    #[serde(default)]
    pub damage_up: Option<f64>,
    #[serde(default)]
    pub damage_down: Option<f64>,
}

/// Upgrade step sizes per metric
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StepsDef {
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub damage: Option<f64>,
}

/// The `defaults` block of a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldDefaultsDef {
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub damage: Option<f64>,
    #[serde(default)]
    pub warning_distance: Option<f64>,
    #[serde(default)]
    pub damage_buffer: Option<f64>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub upgradable: Option<bool>,
    #[serde(default)]
    pub shop_enabled: Option<bool>,
    #[serde(default)]
    pub limits: LimitsDef,
    #[serde(default)]
    pub costs: CostsDef,
    #[serde(default)]
    pub steps: StepsDef,
}

impl WorldDefaultsDef {
    /// Merge this block over the built-in defaults
    pub fn into_defaults(self) -> WorldDefaults {
        let mut defaults = WorldDefaults::default();
        if let Some(size) = self.size {
            defaults.size = size;
        }
        if let Some(speed) = self.speed {
            defaults.speed = speed;
        }
        if let Some(damage) = self.damage {
            defaults.damage = damage;
        }
        if let Some(warning) = self.warning_distance {
            defaults.warning_distance = warning;
        }
        if let Some(buffer) = self.damage_buffer {
            defaults.damage_buffer = buffer;
        }
        if let Some(enabled) = self.enabled {
            defaults.enabled = enabled;
        }
        if let Some(upgradable) = self.upgradable {
            defaults.upgradable = upgradable;
        }
        if let Some(shop) = self.shop_enabled {
            defaults.shop_enabled = shop;
        }
        if let Some(pair) = self.limits.size {
            defaults.player_min_size = pair.min;
            defaults.player_max_size = pair.max;
        }
        if let Some(pair) = self.limits.speed {
            defaults.player_min_speed = pair.min;
            defaults.player_max_speed = pair.max;
        }
        if let Some(pair) = self.limits.damage {
            defaults.player_min_damage = pair.min;
            defaults.player_max_damage = pair.max;
        }
        if let Some(cost) = self.costs.expand {
            defaults.expand_cost = cost;
        }
        if let Some(cost) = self.costs.shrink {
            defaults.shrink_cost = cost;
        }
        if let Some(cost) = self.costs.speed_up {
            defaults.speed_up_cost = cost;
        }
        if let Some(cost) = self.costs.speed_down {
            defaults.speed_down_cost = cost;
        }
        if let Some(cost) = self.costs.damage_up {
            defaults.damage_up_cost = cost;
        }
        if let Some(cost) = self.costs.damage_down {
            defaults.damage_down_cost = cost;
        }
        if let Some(step) = self.steps.size {
            defaults.upgrade_step_size = step;
        }
        if let Some(step) = self.steps.speed {
            defaults.upgrade_step_speed = step;
        }
        if let Some(step) = self.steps.damage {
            defaults.upgrade_step_damage = step;
        }
        defaults
    }
}
