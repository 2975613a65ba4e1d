//! Input history trait for storing tick-indexed input records
//!
//! This trait is used by:
//! - `tandem-ring` for the fixed-capacity ring buffers each engine owns
//! - `tandem-sync` to read back local and remote inputs during rollback
//!
//! A history maps a tick to one fixed-width record. Bounded implementations
//! reuse slots, so every slot remembers which tick it currently holds; that
//! tag is what lets callers tell a live record from one that has already
//! been overwritten.

use crate::{Result, Tick};

/// Trait for tick-indexed input storage.
pub trait InputHistory {
    /// Store `record` for `tick`, replacing whatever shared its slot.
    ///
    /// Returns the tick that was evicted from the slot, if the slot held a
    /// different tick before the write. Overwriting the same tick is not an
    /// eviction.
    fn write(&mut self, tick: Tick, record: &[u8]) -> Result<Option<Tick>>;

    /// Raw contents of the slot `tick` maps to, without checking its tag.
    fn read(&self, tick: Tick) -> &[u8];

    /// The record for exactly `tick`, if it is still stored.
    fn get(&self, tick: Tick) -> Option<&[u8]>;

    /// The tick currently held by the slot `tick` maps to.
    ///
    /// Returns `None` if that slot has never been written.
    fn slot_tick(&self, tick: Tick) -> Option<Tick>;

    /// Forget every stored record.
    fn clear(&mut self);

    /// Number of slots.
    fn capacity(&self) -> usize;

    /// Width of every record in bytes.
    fn width(&self) -> usize;

    /// Number of slots currently holding a record.
    fn len(&self) -> usize;

    /// Check if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the tick range of stored records.
    ///
    /// Returns `Some((oldest_tick, newest_tick))`, or `None` when empty.
    fn tick_range(&self) -> Option<(Tick, Tick)>;

    /// Check whether the record for `tick` is still stored.
    fn contains(&self, tick: Tick) -> bool {
        self.get(tick).is_some()
    }

    /// The tick a write to `tick` would evict, if any.
    fn would_evict(&self, tick: Tick) -> Option<Tick> {
        self.slot_tick(tick).filter(|held| *held != tick)
    }
}
