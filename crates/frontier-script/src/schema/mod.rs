//! Config schema definitions

mod multiplier;
mod world;

pub use multiplier::{MultiplierDef, RangeDef};
pub use world::{CostsDef, LimitPair, LimitsDef, StepsDef, WorldDefaultsDef};
