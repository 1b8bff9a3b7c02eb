//! Identity types for players, worlds, and purchasable upgrades

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// Create a new player ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player:{}", self.0)
    }
}

/// Identifier for a world, referenced by name
///
/// Uses a string-based ID so worlds created by the host can be referenced
/// before any border state exists for them
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(pub String);

impl WorldId {
    /// Create a new world ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WorldId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for WorldId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One kind of purchasable border upgrade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceType {
    /// Grow the border by a number of blocks
    Expand,
    /// Contract the border by a number of blocks
    Shrink,
    /// Raise the border's movement speed by one step
    SpeedUp,
    /// Lower the border's movement speed by one step
    SpeedDown,
    /// Raise the outside-border damage by one step
    DamageUp,
    /// Lower the outside-border damage by one step
    DamageDown,
}

impl PriceType {
    /// All price types, in display order
    pub const ALL: [PriceType; 6] = [
        PriceType::Expand,
        PriceType::Shrink,
        PriceType::SpeedUp,
        PriceType::SpeedDown,
        PriceType::DamageUp,
        PriceType::DamageDown,
    ];

    /// The wire spelling used in config files and persistence keys
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceType::Expand => "expand",
            PriceType::Shrink => "shrink",
            PriceType::SpeedUp => "speed-up",
            PriceType::SpeedDown => "speed-down",
            PriceType::DamageUp => "damage-up",
            PriceType::DamageDown => "damage-down",
        }
    }

    /// Parse a wire spelling back to a price type
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "expand" => Some(PriceType::Expand),
            "shrink" => Some(PriceType::Shrink),
            "speed-up" => Some(PriceType::SpeedUp),
            "speed-down" => Some(PriceType::SpeedDown),
            "damage-up" => Some(PriceType::DamageUp),
            "damage-down" => Some(PriceType::DamageDown),
            _ => None,
        }
    }
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id() {
        let id = PlayerId::new(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(format!("{}", id), "player:7");
    }

    #[test]
    fn test_world_id() {
        let id = WorldId::new("overworld");
        assert_eq!(id.as_str(), "overworld");
        assert_eq!(format!("{}", id), "overworld");
    }

    #[test]
    fn test_price_type_round_trip() {
        for pt in PriceType::ALL {
            assert_eq!(PriceType::parse(pt.as_str()), Some(pt));
        }
        assert_eq!(PriceType::parse("teleport"), None);
    }
}
