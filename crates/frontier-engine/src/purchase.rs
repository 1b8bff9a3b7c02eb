//! Purchase requests and the transaction state machine

use frontier_core::{PlayerId, PriceType, WorldId};
use serde::{Deserialize, Serialize};

/// One kind of border purchase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PurchaseKind {
    /// Grow the border by a number of blocks
    Expand { blocks: f64 },
    /// Contract the border by a number of blocks
    Shrink { blocks: f64 },
    /// Move the border speed one step up or down
    SpeedAdjust { up: bool },
    /// Move the border damage one step; `down` is the usual upgrade
    DamageAdjust { down: bool },
}

impl PurchaseKind {
    /// The price type this purchase is billed under
    pub fn price_type(&self) -> PriceType {
        match self {
            PurchaseKind::Expand { .. } => PriceType::Expand,
            PurchaseKind::Shrink { .. } => PriceType::Shrink,
            PurchaseKind::SpeedAdjust { up: true } => PriceType::SpeedUp,
            PurchaseKind::SpeedAdjust { up: false } => PriceType::SpeedDown,
            PurchaseKind::DamageAdjust { down: false } => PriceType::DamageUp,
            PurchaseKind::DamageAdjust { down: true } => PriceType::DamageDown,
        }
    }
}

/// A purchase request as delivered by the host event source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// Who is paying
    pub player: PlayerId,
    /// Which world's border is being changed
    pub world: WorldId,
    /// What is being bought
    pub kind: PurchaseKind,
}

impl PurchaseRequest {
    /// Create a purchase request
    pub fn new(player: PlayerId, world: impl Into<WorldId>, kind: PurchaseKind) -> Self {
        Self {
            player,
            world: world.into(),
            kind,
        }
    }
}

/// The terminal stage a purchase transaction reached.
///
/// Every purchase walks Requested -> Validated -> Priced -> Paid -> Applied
/// -> Persisted, or drops to Rejected at any step before payment. Once the
/// debit has succeeded the transaction always runs to at least Applied; a
/// failed durable write stops it there, to be retried by the next autosave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseStage {
    Rejected,
    Applied,
    Persisted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_type_mapping() {
        assert_eq!(
            PurchaseKind::Expand { blocks: 10.0 }.price_type(),
            PriceType::Expand
        );
        assert_eq!(
            PurchaseKind::SpeedAdjust { up: true }.price_type(),
            PriceType::SpeedUp
        );
        assert_eq!(
            PurchaseKind::SpeedAdjust { up: false }.price_type(),
            PriceType::SpeedDown
        );
        assert_eq!(
            PurchaseKind::DamageAdjust { down: true }.price_type(),
            PriceType::DamageDown
        );
        assert_eq!(
            PurchaseKind::DamageAdjust { down: false }.price_type(),
            PriceType::DamageUp
        );
    }
}
