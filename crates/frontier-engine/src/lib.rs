//! Frontier Engine - The border economy orchestrator
//!
//! Composes the frontier-core stores into atomic purchase transactions:
//! validate, price, pay, apply, advance, persist. Payment strictly precedes
//! mutation; a failed debit leaves every store untouched, and a failed
//! durable write is logged and retried by the next autosave rather than
//! rolling back the in-memory state.
//!
//! The engine runs cooperatively on the host's single simulation thread.
//! Hosts drive `autosave` and `maintain` from their own timers.

mod admin;
mod clock;
mod engine;
mod error;
mod purchase;
mod result;

pub use admin::{Bound, Metric};
pub use clock::SystemClock;
pub use engine::BorderEconomy;
pub use error::{Error, Result};
pub use purchase::{PurchaseKind, PurchaseRequest, PurchaseStage};
pub use result::PurchaseOutcome;
