//! Tandem Core - Shared vocabulary for two-peer rollback synchronization
//!
//! This crate provides the types every other tandem crate speaks in:
//! - `Tick` - Signed logical time unit (negative while the input delay warms up)
//! - `Record` - Owned, fixed-width opaque byte blob (state or input)
//! - `StepFunction` - The injected deterministic transition `(state, a, b) -> state'`
//! - `InputHistory` - Trait for tick-indexed input storage
//! - `Side` - Which peer a record belongs to
//!
//! The engine never interprets the bytes inside a `Record`. The host decides
//! what a state or input means; tandem only moves the bytes around and calls
//! the step function in the right order.

mod error;
mod history;
mod record;
mod step;

pub use error::{Error, Result};
pub use history::InputHistory;
pub use record::Record;
pub use step::{apply_step, Side, StepFunction};

/// A discrete tick identifier.
///
/// Signed because an engine starts at `-delay` and counts up through the
/// warm-up window before reaching tick 0.
pub type Tick = i64;
