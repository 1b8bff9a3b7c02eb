//! Progressive price multipliers
//!
//! Each price type can carry a multiplier formula applied on top of the base
//! cost, keyed by the player's purchase level for that upgrade. Formulas are
//! fixed, linear, exponential, or custom text run through the restricted
//! formula evaluator.

use crate::formula;
use crate::gateway::Gateway;
use crate::identity::{PlayerId, PriceType, WorldId};
use crate::progression::ProgressionStore;
use crate::time::{EpochMs, DAY_MS, MONTH_MS, WEEK_MS};
use crate::value::{record_bool, record_float, record_str, Record, Value, ValueMap};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Lowest multiplier any config may produce
pub const MIN_MULTIPLIER: f64 = 0.1;
/// Highest multiplier any config may produce
pub const MAX_MULTIPLIER: f64 = 10.0;

/// How a multiplier grows with the purchase level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FormulaKind {
    /// Constant: `base`
    #[default]
    Fixed,
    /// `base + step * level`
    Linear,
    /// `base ^ level`
    Exponential,
    /// Custom formula text with `{level}`-style placeholders
    Custom,
}

impl FormulaKind {
    /// The wire spelling used in config files and records
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaKind::Fixed => "fixed",
            FormulaKind::Linear => "linear",
            FormulaKind::Exponential => "exponential",
            FormulaKind::Custom => "custom",
        }
    }

    /// Parse a wire spelling, defaulting to fixed
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "linear" => FormulaKind::Linear,
            "exponential" => FormulaKind::Exponential,
            "custom" => FormulaKind::Custom,
            _ => FormulaKind::Fixed,
        }
    }
}

/// When a player's level automatically returns to zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ResetSchedule {
    #[default]
    Never,
    Daily,
    Weekly,
    Monthly,
}

impl ResetSchedule {
    /// The schedule period, if any
    pub fn period_ms(&self) -> Option<EpochMs> {
        match self {
            ResetSchedule::Never => None,
            ResetSchedule::Daily => Some(DAY_MS),
            ResetSchedule::Weekly => Some(WEEK_MS),
            ResetSchedule::Monthly => Some(MONTH_MS),
        }
    }

    /// The wire spelling used in config files and records
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetSchedule::Never => "never",
            ResetSchedule::Daily => "daily",
            ResetSchedule::Weekly => "weekly",
            ResetSchedule::Monthly => "monthly",
        }
    }

    /// Parse a wire spelling; unknown values are rejected
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "never" => Some(ResetSchedule::Never),
            "daily" => Some(ResetSchedule::Daily),
            "weekly" => Some(ResetSchedule::Weekly),
            "monthly" => Some(ResetSchedule::Monthly),
            _ => None,
        }
    }
}

/// Multiplier configuration for one price type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplierConfig {
    /// Which price type this config applies to
    pub price_type: PriceType,
    enabled: bool,
    kind: FormulaKind,
    base_value: f64,
    step: f64,
    custom_formula: String,
    min_multiplier: f64,
    max_multiplier: f64,
    reset_schedule: ResetSchedule,
}

impl MultiplierConfig {
    /// Create a config with neutral defaults (fixed multiplier of 1.0)
    pub fn new(price_type: PriceType) -> Self {
        Self {
            price_type,
            enabled: true,
            kind: FormulaKind::Fixed,
            base_value: 1.0,
            step: 0.0,
            custom_formula: String::new(),
            min_multiplier: MIN_MULTIPLIER,
            max_multiplier: MAX_MULTIPLIER,
            reset_schedule: ResetSchedule::Never,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
    pub fn kind(&self) -> FormulaKind {
        self.kind
    }
    pub fn base_value(&self) -> f64 {
        self.base_value
    }
    pub fn step(&self) -> f64 {
        self.step
    }
    pub fn custom_formula(&self) -> &str {
        &self.custom_formula
    }
    pub fn min_multiplier(&self) -> f64 {
        self.min_multiplier
    }
    pub fn max_multiplier(&self) -> f64 {
        self.max_multiplier
    }
    pub fn reset_schedule(&self) -> ResetSchedule {
        self.reset_schedule
    }

    // Admin edit setters, clamped to sane ranges.

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_kind(&mut self, kind: FormulaKind) {
        self.kind = kind;
    }

    pub fn set_base_value(&mut self, value: f64) {
        self.base_value = value.clamp(0.1, 10.0);
    }

    pub fn set_step(&mut self, step: f64) {
        self.step = step.clamp(0.0, 1.0);
    }

    pub fn set_custom_formula(&mut self, formula: impl Into<String>) {
        self.custom_formula = formula.into();
    }

    pub fn set_limits(&mut self, min: f64, max: f64) {
        self.min_multiplier = min.clamp(0.1, 1.0);
        self.max_multiplier = max.clamp(1.0, 10.0);
    }

    pub fn set_reset_schedule(&mut self, schedule: ResetSchedule) {
        self.reset_schedule = schedule;
    }

    /// Compute the multiplier for a purchase level, clamped into
    /// `[min_multiplier, max_multiplier]`
    pub fn multiplier(&self, level: u32) -> f64 {
        if !self.enabled {
            return 1.0;
        }
        let raw = match self.kind {
            FormulaKind::Fixed => self.base_value,
            FormulaKind::Linear => self.base_value + self.step * level as f64,
            FormulaKind::Exponential => self.base_value.powi(level as i32),
            FormulaKind::Custom => self.eval_custom(level),
        };
        raw.clamp(self.min_multiplier, self.max_multiplier)
    }

    fn eval_custom(&self, level: u32) -> f64 {
        if self.custom_formula.is_empty() {
            return 1.0;
        }
        let src = self.substitute(level);
        match formula::evaluate(&src) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    price_type = self.price_type.as_str(),
                    formula = %self.custom_formula,
                    %err,
                    "custom multiplier formula failed, using 1.0"
                );
                1.0
            }
        }
    }

    /// Substitute `{level} {base} {step} {min} {max}` placeholders, then
    /// strip any remaining braces so `{sqrt}(...)`-style spellings still
    /// reach the evaluator as plain function calls.
    fn substitute(&self, level: u32) -> String {
        self.custom_formula
            .replace("{level}", &level.to_string())
            .replace("{base}", &self.base_value.to_string())
            .replace("{step}", &self.step.to_string())
            .replace("{min}", &self.min_multiplier.to_string())
            .replace("{max}", &self.max_multiplier.to_string())
            .replace(['{', '}'], "")
    }

    /// The multiplier sequence for levels `0..levels`
    pub fn simulate(&self, levels: u32) -> Vec<f64> {
        (0..levels).map(|level| self.multiplier(level)).collect()
    }

    fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert("enabled".into(), self.enabled.into());
        map.insert("type".into(), self.kind.as_str().into());
        map.insert("baseValue".into(), self.base_value.into());
        map.insert("step".into(), self.step.into());
        map.insert("customFormula".into(), self.custom_formula.as_str().into());
        map.insert("minMultiplier".into(), self.min_multiplier.into());
        map.insert("maxMultiplier".into(), self.max_multiplier.into());
        map.insert("resetSchedule".into(), self.reset_schedule.as_str().into());
        map.into()
    }

    fn from_map(price_type: PriceType, map: &ValueMap) -> Self {
        let mut config = Self::new(price_type);
        config.enabled = record_bool(map, "enabled", true);
        config.kind = FormulaKind::parse(record_str(map, "type", "fixed"));
        config.base_value = record_float(map, "baseValue", 1.0);
        config.step = record_float(map, "step", 0.0);
        config.custom_formula = record_str(map, "customFormula", "").to_string();
        config.min_multiplier = record_float(map, "minMultiplier", MIN_MULTIPLIER);
        config.max_multiplier = record_float(map, "maxMultiplier", MAX_MULTIPLIER);
        config.reset_schedule =
            ResetSchedule::parse(record_str(map, "resetSchedule", "never")).unwrap_or_default();
        config
    }
}

/// The pricing engine: per-price-type multiplier configs plus the pricing
/// algorithm that combines them with player progression
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    configs: IndexMap<PriceType, MultiplierConfig>,
}

impl PricingEngine {
    /// Create an engine with no configs (all prices pass through)
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the config for a price type
    pub fn config(&self, price_type: PriceType) -> Option<&MultiplierConfig> {
        self.configs.get(&price_type)
    }

    /// Get the config for a price type, creating a neutral one if absent
    pub fn config_mut(&mut self, price_type: PriceType) -> &mut MultiplierConfig {
        self.configs
            .entry(price_type)
            .or_insert_with(|| MultiplierConfig::new(price_type))
    }

    /// Install or replace a config
    pub fn insert(&mut self, config: MultiplierConfig) {
        self.configs.insert(config.price_type, config);
    }

    /// Iterate all configs
    pub fn iter(&self) -> impl Iterator<Item = &MultiplierConfig> {
        self.configs.values()
    }

    /// The final price a specific player pays right now.
    ///
    /// Refreshes the player's progression cache, applies an elapsed reset
    /// schedule *before* pricing, then multiplies the base cost by the
    /// level's multiplier. Absent or disabled configs pass the base cost
    /// through unchanged.
    pub fn price_for(
        &self,
        progressions: &mut ProgressionStore,
        player: PlayerId,
        world: &WorldId,
        price_type: PriceType,
        base_cost: f64,
        now: EpochMs,
        gateway: &dyn Gateway,
    ) -> f64 {
        let Some(config) = self.configs.get(&price_type) else {
            return base_cost;
        };
        if !config.is_enabled() {
            return base_cost;
        }

        progressions.refresh_if_stale(player, now, gateway);

        if let Some(period) = config.reset_schedule().period_ms() {
            progressions.apply_schedule_reset(player, world, price_type, period, now);
        }

        let level = progressions.level(player, world, price_type);
        base_cost * config.multiplier(level)
    }

    /// Flatten every config into the multipliers record
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        for (price_type, config) in &self.configs {
            record.insert(price_type.as_str().to_string(), config.to_value());
        }
        record
    }

    /// Rebuild configs from the multipliers record
    pub fn from_record(record: &Record) -> Self {
        let mut engine = Self::new();
        for (key, value) in record {
            let (Some(price_type), Some(map)) = (PriceType::parse(key), value.as_map()) else {
                continue;
            };
            engine.insert(MultiplierConfig::from_map(price_type, map));
        }
        engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;

    fn config(kind: FormulaKind, base: f64, step: f64) -> MultiplierConfig {
        let mut c = MultiplierConfig::new(PriceType::Expand);
        c.set_kind(kind);
        c.set_base_value(base);
        c.set_step(step);
        c
    }

    #[test]
    fn test_fixed_multiplier() {
        let c = config(FormulaKind::Fixed, 2.0, 0.0);
        assert_eq!(c.multiplier(0), 2.0);
        assert_eq!(c.multiplier(50), 2.0);
    }

    #[test]
    fn test_linear_multiplier() {
        let c = config(FormulaKind::Linear, 1.0, 0.01);
        assert_eq!(c.multiplier(0), 1.0);
        assert!((c.multiplier(10) - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_exponential_multiplier_within_limits() {
        // base 1.05, level 10 -> about 1.6289, inside [1.0, 5.0]
        let mut c = config(FormulaKind::Exponential, 1.05, 0.0);
        c.set_limits(1.0, 5.0);
        let m = c.multiplier(10);
        assert!((m - 1.05f64.powi(10)).abs() < 1e-12);
        assert!((m - 1.6289).abs() < 1e-3);
    }

    #[test]
    fn test_multiplier_clamped_to_limits() {
        let mut c = config(FormulaKind::Exponential, 2.0, 0.0);
        c.set_limits(1.0, 5.0);
        assert_eq!(c.multiplier(20), 5.0);

        let mut c = config(FormulaKind::Fixed, 0.1, 0.0);
        c.set_limits(0.5, 10.0);
        assert_eq!(c.multiplier(0), 0.5);
    }

    #[test]
    fn test_disabled_config_is_neutral() {
        let mut c = config(FormulaKind::Fixed, 3.0, 0.0);
        c.set_enabled(false);
        assert_eq!(c.multiplier(7), 1.0);
    }

    #[test]
    fn test_custom_formula_matches_linear() {
        let linear = config(FormulaKind::Linear, 1.0, 0.01);
        let mut custom = config(FormulaKind::Custom, 1.0, 0.01);
        custom.set_custom_formula("{base} + {level} * {step}");

        for level in 0..=50 {
            assert!(
                (custom.multiplier(level) - linear.multiplier(level)).abs() < 1e-9,
                "level {}",
                level
            );
        }
    }

    #[test]
    fn test_custom_formula_failure_falls_back_to_one() {
        let mut c = config(FormulaKind::Custom, 1.0, 0.0);
        c.set_custom_formula("eval({level})");
        assert_eq!(c.multiplier(3), 1.0);

        // Empty formula is also neutral
        let c = config(FormulaKind::Custom, 1.0, 0.0);
        assert_eq!(c.multiplier(3), 1.0);
    }

    #[test]
    fn test_custom_formula_braced_function_spelling() {
        let mut c = config(FormulaKind::Custom, 1.0, 0.0);
        c.set_custom_formula("{sqrt}({level}) + 1");
        c.set_limits(0.1, 10.0);
        assert_eq!(c.multiplier(9), 4.0);
    }

    #[test]
    fn test_price_for_passthrough_without_config() {
        let gateway = MemoryGateway::new();
        let engine = PricingEngine::new();
        let mut progressions = ProgressionStore::new();

        let price = engine.price_for(
            &mut progressions,
            PlayerId::new(1),
            &WorldId::new("overworld"),
            PriceType::Expand,
            100.0,
            1_000,
            &gateway,
        );
        assert_eq!(price, 100.0);
    }

    #[test]
    fn test_price_for_uses_progression_level() {
        let gateway = MemoryGateway::new();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);

        let mut engine = PricingEngine::new();
        engine.insert(config(FormulaKind::Linear, 1.0, 0.5));

        let mut progressions = ProgressionStore::new();
        progressions.advance(player, &world, PriceType::Expand, 100.0, 1_000);
        progressions.advance(player, &world, PriceType::Expand, 150.0, 2_000);

        let price = engine.price_for(
            &mut progressions,
            player,
            &world,
            PriceType::Expand,
            100.0,
            3_000,
            &gateway,
        );
        // level 2 -> multiplier 2.0
        assert_eq!(price, 200.0);
    }

    #[test]
    fn test_price_for_applies_daily_reset_before_pricing() {
        let gateway = MemoryGateway::new();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);

        let mut c = config(FormulaKind::Linear, 1.0, 0.5);
        c.set_reset_schedule(ResetSchedule::Daily);
        let mut engine = PricingEngine::new();
        engine.insert(c);

        let mut progressions = ProgressionStore::new();
        progressions.advance(player, &world, PriceType::Expand, 100.0, 1_000);
        progressions.advance(player, &world, PriceType::Expand, 150.0, 1_000);

        // More than 24h since the entry's creation reset stamp
        let later = 1_000 + 90_000_000;
        let price = engine.price_for(
            &mut progressions,
            player,
            &world,
            PriceType::Expand,
            100.0,
            later,
            &gateway,
        );
        assert_eq!(price, 100.0); // level-0 price
        assert_eq!(progressions.level(player, &world, PriceType::Expand), 0);
    }

    #[test]
    fn test_record_round_trip() {
        let mut engine = PricingEngine::new();
        let mut c = config(FormulaKind::Exponential, 1.05, 0.0);
        c.set_limits(1.0, 5.0);
        c.set_reset_schedule(ResetSchedule::Weekly);
        engine.insert(c);
        let mut c2 = MultiplierConfig::new(PriceType::SpeedUp);
        c2.set_kind(FormulaKind::Custom);
        c2.set_custom_formula("{base} + {level} * 0.2");
        engine.insert(c2);

        let restored = PricingEngine::from_record(&engine.to_record());
        let c = restored.config(PriceType::Expand).unwrap();
        assert_eq!(c.kind(), FormulaKind::Exponential);
        assert_eq!(c.base_value(), 1.05);
        assert_eq!(c.reset_schedule(), ResetSchedule::Weekly);
        assert_eq!(c.max_multiplier(), 5.0);

        let c2 = restored.config(PriceType::SpeedUp).unwrap();
        assert_eq!(c2.custom_formula(), "{base} + {level} * 0.2");
    }
}
