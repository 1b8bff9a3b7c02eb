//! RON config loader

use crate::error::{Error, Result};
use crate::schema::{MultiplierDef, WorldDefaultsDef};
use frontier_core::{MultiplierConfig, PricingEngine, WorldDefaults};
use std::fs;
use std::path::Path;

/// Loaded economy configuration
#[derive(Debug, Default)]
pub struct EconomyDefs {
    /// Default-population policy for new worlds, if configured
    pub defaults: Option<WorldDefaults>,
    /// Multiplier configs, one per price type
    pub multipliers: Vec<MultiplierConfig>,
}

impl EconomyDefs {
    /// Build a pricing engine from the loaded multiplier configs
    pub fn pricing_engine(&self) -> PricingEngine {
        let mut engine = PricingEngine::new();
        for config in &self.multipliers {
            engine.insert(config.clone());
        }
        engine
    }
}

/// Loader for RON economy config files
pub struct Loader {
    defs: EconomyDefs,
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            defs: EconomyDefs::default(),
        }
    }

    /// Load a single RON file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        // Determine the block type from the filename or the content
        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

        if filename.contains("multiplier") || content.contains("multipliers:") {
            self.load_multipliers_str(&content)?;
        } else if filename.contains("default")
            || filename.contains("world")
            || content.contains("defaults:")
        {
            self.load_defaults_str(&content)?;
        } else {
            // Try each format before giving up
            if self.load_multipliers_str(&content).is_ok() {
                return Ok(());
            }
            self.load_defaults_str(&content)?;
        }

        Ok(())
    }

    /// Load a `defaults` block from a RON string
    pub fn load_defaults_str(&mut self, content: &str) -> Result<()> {
        #[derive(serde::Deserialize)]
        struct DefaultsFile {
            defaults: WorldDefaultsDef,
        }

        let file: DefaultsFile = ron::from_str(content)?;
        if self.defs.defaults.is_some() {
            return Err(Error::DuplicateDefinition("defaults".to_string()));
        }
        self.defs.defaults = Some(file.defaults.into_defaults());
        Ok(())
    }

    /// Load a `multipliers` block from a RON string
    pub fn load_multipliers_str(&mut self, content: &str) -> Result<()> {
        #[derive(serde::Deserialize)]
        struct MultiplierFile {
            multipliers: Vec<MultiplierDef>,
        }

        let file: MultiplierFile = ron::from_str(content)?;
        for def in file.multipliers {
            let config = def.into_config()?;
            if self
                .defs
                .multipliers
                .iter()
                .any(|c| c.price_type == config.price_type)
            {
                return Err(Error::DuplicateDefinition(
                    config.price_type.as_str().to_string(),
                ));
            }
            self.defs.multipliers.push(config);
        }
        Ok(())
    }

    /// Load all RON files from a directory, recursively
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let file_path = entry.path();

            if file_path.extension().map(|e| e == "ron").unwrap_or(false) {
                self.load_file(&file_path)?;
            } else if file_path.is_dir() {
                self.load_directory(&file_path)?;
            }
        }

        Ok(())
    }

    /// Finish loading and return the economy definitions
    pub fn finish(self) -> EconomyDefs {
        self.defs
    }

    /// Get the current definitions (for inspection during loading)
    pub fn defs(&self) -> &EconomyDefs {
        &self.defs
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontier_core::{FormulaKind, PriceType, ResetSchedule};

    #[test]
    fn test_load_multipliers() {
        let content = r#"
        (
            multipliers: [
                (
                    price_type: "expand",
                    kind: "linear",
                    base_value: 1.0,
                    step: 0.01,
                ),
                (
                    price_type: "speed-up",
                    kind: "exponential",
                    base_value: 1.05,
                    limits: Some((min: 1.0, max: 5.0)),
                    reset_schedule: "weekly",
                ),
            ]
        )
        "#;

        let mut loader = Loader::new();
        loader.load_multipliers_str(content).unwrap();

        let defs = loader.finish();
        assert_eq!(defs.multipliers.len(), 2);

        let engine = defs.pricing_engine();
        let expand = engine.config(PriceType::Expand).unwrap();
        assert_eq!(expand.kind(), FormulaKind::Linear);
        let speed = engine.config(PriceType::SpeedUp).unwrap();
        assert_eq!(speed.reset_schedule(), ResetSchedule::Weekly);
    }

    #[test]
    fn test_load_defaults() {
        let content = r#"
        (
            defaults: (
                size: Some(500.0),
                upgradable: Some(false),
                costs: (expand: Some(3.0)),
            )
        )
        "#;

        let mut loader = Loader::new();
        loader.load_defaults_str(content).unwrap();

        let defs = loader.finish();
        let defaults = defs.defaults.unwrap();
        assert_eq!(defaults.size, 500.0);
        assert!(!defaults.upgradable);
        assert_eq!(defaults.expand_cost, 3.0);
    }

    #[test]
    fn test_duplicate_multiplier_rejected() {
        let content = r#"
        (
            multipliers: [
                (price_type: "expand"),
                (price_type: "expand"),
            ]
        )
        "#;

        let mut loader = Loader::new();
        assert!(matches!(
            loader.load_multipliers_str(content),
            Err(Error::DuplicateDefinition(_))
        ));
    }

    #[test]
    fn test_unknown_price_type_fails_load() {
        let content = r#"
        (
            multipliers: [
                (price_type: "teleport"),
            ]
        )
        "#;

        let mut loader = Loader::new();
        assert!(loader.load_multipliers_str(content).is_err());
    }
}
