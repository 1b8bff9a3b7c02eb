//! Stored models, one per gateway key family.

mod border;
mod economy;
mod progression;

pub use border::StoredBorder;
pub use economy::{StoredBalances, StoredMultipliers};
pub use progression::StoredProgression;
