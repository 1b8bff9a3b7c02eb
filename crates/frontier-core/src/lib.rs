//! Frontier Core - Progressive border economy building blocks
//!
//! This crate provides the data model and stores the border economy engine
//! composes:
//! - Per-world border state with clamp-enforcing mutators (`BorderState`)
//! - Currency accounts with atomic debit/credit (`Ledger`, `CurrencySource`)
//! - Progressive price multipliers and the restricted formula evaluator
//! - Per-player purchase progression with reset schedules
//! - The persistence gateway interface and flat record shape
//!
//! Nothing here reads a wall clock: every time-dependent operation takes an
//! explicit `now`, which keeps reset schedules and cache staleness fully
//! deterministic under test.

mod border;
mod error;
pub mod formula;
mod gateway;
mod identity;
mod ledger;
mod pricing;
mod progression;
pub mod time;
mod value;

pub use border::{BorderState, BorderStore, WorldDefaults};
pub use error::{Error, Result};
pub use formula::{FormulaError, FormulaResult};
pub use gateway::{border_key, progression_key, Gateway, MemoryGateway, BALANCES_KEY, MULTIPLIERS_KEY};
pub use identity::{PlayerId, PriceType, WorldId};
pub use ledger::{CurrencySource, Ledger};
pub use pricing::{
    FormulaKind, MultiplierConfig, PricingEngine, ResetSchedule, MAX_MULTIPLIER, MIN_MULTIPLIER,
};
pub use progression::{Progression, ProgressionStore, Window, WorldProgressStats};
pub use time::{Clock, EpochMs, FixedClock, CACHE_STALE_MS, DAY_MS, MONTH_MS, WEEK_MS};
pub use value::{record_bool, record_float, record_int, record_str, Record, Value, ValueMap};
