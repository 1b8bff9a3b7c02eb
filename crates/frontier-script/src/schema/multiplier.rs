//! Multiplier-config schema

use crate::error::{Error, Result};
use frontier_core::{FormulaKind, MultiplierConfig, PriceType, ResetSchedule};
use serde::{Deserialize, Serialize};

/// Clamp bounds for a multiplier
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RangeDef {
    pub min: f64,
    pub max: f64,
}

/// One multiplier definition, keyed by price type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplierDef {
    /// Wire spelling of the price type, e.g. "expand" or "speed-up"
    pub price_type: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Formula kind: "fixed", "linear", "exponential", or "custom"
    #[serde(default)]
    pub kind: String,
    #[serde(default = "default_base_value")]
    pub base_value: f64,
    #[serde(default)]
    pub step: f64,
    #[serde(default)]
    pub custom_formula: String,
    #[serde(default)]
    pub limits: Option<RangeDef>,
    /// Reset schedule: "never", "daily", "weekly", or "monthly"
    #[serde(default)]
    pub reset_schedule: String,
}

fn default_enabled() -> bool {
    true
}

fn default_base_value() -> f64 {
    1.0
}

impl MultiplierDef {
    /// Convert to an engine config, validating the price type and schedule
    pub fn into_config(self) -> Result<MultiplierConfig> {
        let price_type = PriceType::parse(&self.price_type)
            .ok_or_else(|| Error::UnknownPriceType(self.price_type.clone()))?;

        let mut config = MultiplierConfig::new(price_type);
        config.set_enabled(self.enabled);
        config.set_kind(FormulaKind::parse(&self.kind));
        config.set_base_value(self.base_value);
        config.set_step(self.step);
        config.set_custom_formula(self.custom_formula);
        if let Some(limits) = self.limits {
            config.set_limits(limits.min, limits.max);
        }
        if !self.reset_schedule.is_empty() {
            let schedule = ResetSchedule::parse(&self.reset_schedule).ok_or_else(|| {
                Error::InvalidSchema(format!("bad reset schedule: {}", self.reset_schedule))
            })?;
            config.set_reset_schedule(schedule);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_def_ron() {
        let ron_str = r#"
        (
            price_type: "expand",
            kind: "linear",
            base_value: 1.0,
            step: 0.01,
            limits: Some((min: 1.0, max: 5.0)),
            reset_schedule: "daily",
        )
        "#;

        let def: MultiplierDef = ron::from_str(ron_str).unwrap();
        let config = def.into_config().unwrap();
        assert_eq!(config.price_type, PriceType::Expand);
        assert_eq!(config.kind(), FormulaKind::Linear);
        assert_eq!(config.step(), 0.01);
        assert_eq!(config.max_multiplier(), 5.0);
        assert_eq!(config.reset_schedule(), ResetSchedule::Daily);
    }

    #[test]
    fn test_unknown_price_type_rejected() {
        let def = MultiplierDef {
            price_type: "teleport".to_string(),
            enabled: true,
            kind: String::new(),
            base_value: 1.0,
            step: 0.0,
            custom_formula: String::new(),
            limits: None,
            reset_schedule: String::new(),
        };
        assert!(matches!(
            def.into_config(),
            Err(Error::UnknownPriceType(_))
        ));
    }

    #[test]
    fn test_bad_schedule_rejected() {
        let def = MultiplierDef {
            price_type: "expand".to_string(),
            enabled: true,
            kind: String::new(),
            base_value: 1.0,
            step: 0.0,
            custom_formula: String::new(),
            limits: None,
            reset_schedule: "hourly".to_string(),
        };
        assert!(def.into_config().is_err());
    }
}
