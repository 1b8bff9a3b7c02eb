//! Structured purchase results

use crate::purchase::PurchaseStage;
use serde::{Deserialize, Serialize};

/// The outcome of a purchase operation.
///
/// Purchases never fail with an error; every validation, pricing, and
/// payment problem is folded into a human-readable rejection here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOutcome {
    /// Whether the purchase went through
    pub success: bool,
    /// Human-readable description of what happened
    pub message: String,
    /// The resulting live value (size, speed, or damage) on success
    pub new_value: Option<f64>,
    /// How much the live value moved on success
    pub change: Option<f64>,
    /// The final price paid on success
    pub cost: Option<f64>,
    /// The terminal transaction stage
    pub stage: PurchaseStage,
}

impl PurchaseOutcome {
    /// A rejected purchase; nothing was mutated
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            new_value: None,
            change: None,
            cost: None,
            stage: PurchaseStage::Rejected,
        }
    }

    /// A completed purchase
    pub fn completed(
        message: impl Into<String>,
        new_value: f64,
        change: f64,
        cost: f64,
        stage: PurchaseStage,
    ) -> Self {
        Self {
            success: true,
            message: message.into(),
            new_value: Some(new_value),
            change: Some(change),
            cost: Some(cost),
            stage,
        }
    }
}
