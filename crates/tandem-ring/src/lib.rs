//! Tandem Ring - Fixed-capacity input history for rollback
//!
//! This crate provides the ring buffer each sync engine keeps for its local
//! and remote inputs.
//!
//! # Features
//!
//! - **Bounded memory**: `capacity * width` bytes, allocated once
//! - **O(1) writes and reads**: tick `T` lives in slot `T mod capacity`
//! - **Tagged slots**: every slot remembers which tick it holds, so a read
//!   of an overwritten tick is detected instead of silently returning the
//!   newer record
//!
//! # Example
//!
//! ```rust
//! use tandem_core::InputHistory;
//! use tandem_ring::InputRing;
//!
//! // Eight slots of two-byte inputs
//! let mut ring = InputRing::new(8, 2).unwrap();
//!
//! ring.write(1, &[1, 0]).unwrap();
//! ring.write(2, &[2, 0]).unwrap();
//! assert_eq!(ring.get(2), Some(&[2u8, 0][..]));
//!
//! // Tick 9 shares a slot with tick 1 and replaces it
//! assert_eq!(ring.write(9, &[9, 0]).unwrap(), Some(1));
//! assert_eq!(ring.get(1), None);
//! ```

use tandem_core::{Error, InputHistory, Result, Tick};

/// A ring buffer of fixed-width input records keyed by tick
#[derive(Debug, Clone)]
pub struct InputRing {
    /// Record storage, `capacity * width` bytes, slot `i` at `i * width`
    data: Vec<u8>,
    /// Tick held by each slot; `None` means never written
    tags: Vec<Option<Tick>>,
    /// Number of slots holding a record
    count: usize,
    capacity: usize,
    width: usize,
}

impl InputRing {
    /// Create a new ring with `capacity` slots of `width`-byte records
    ///
    /// All slots start zero-filled and untagged.
    pub fn new(capacity: usize, width: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        if width == 0 {
            return Err(Error::ZeroWidth);
        }
        Ok(Self {
            data: vec![0u8; capacity * width],
            tags: vec![None; capacity],
            count: 0,
            capacity,
            width,
        })
    }

    /// Get the slot index for a given tick
    fn tick_to_index(&self, tick: Tick) -> usize {
        tick.rem_euclid(self.capacity as Tick) as usize
    }

    fn slot(&self, index: usize) -> &[u8] {
        let start = index * self.width;
        &self.data[start..start + self.width]
    }

    fn slot_mut(&mut self, index: usize) -> &mut [u8] {
        let start = index * self.width;
        &mut self.data[start..start + self.width]
    }

    /// Get all stored records as an iterator (oldest to newest)
    pub fn iter(&self) -> impl Iterator<Item = (Tick, &[u8])> {
        let mut records: Vec<_> = self
            .tags
            .iter()
            .enumerate()
            .filter_map(|(i, tag)| tag.map(|t| (t, self.slot(i))))
            .collect();
        records.sort_by_key(|(t, _)| *t);
        records.into_iter()
    }

    /// Get statistics about the ring
    pub fn stats(&self) -> RingStats {
        let (oldest, newest) = self.tick_range().unwrap_or((0, 0));
        RingStats {
            capacity: self.capacity,
            count: self.count,
            oldest_tick: oldest,
            newest_tick: newest,
        }
    }
}

impl InputHistory for InputRing {
    fn write(&mut self, tick: Tick, record: &[u8]) -> Result<Option<Tick>> {
        if tick < 0 {
            return Err(Error::NegativeTick(tick));
        }
        if record.len() != self.width {
            return Err(Error::RecordSize {
                expected: self.width,
                got: record.len(),
            });
        }

        let index = self.tick_to_index(tick);
        let previous = self.tags[index].replace(tick);
        self.slot_mut(index).copy_from_slice(record);

        match previous {
            None => {
                self.count += 1;
                Ok(None)
            }
            Some(held) if held == tick => Ok(None),
            Some(held) => Ok(Some(held)),
        }
    }

    fn read(&self, tick: Tick) -> &[u8] {
        self.slot(self.tick_to_index(tick))
    }

    fn get(&self, tick: Tick) -> Option<&[u8]> {
        let index = self.tick_to_index(tick);
        match self.tags[index] {
            Some(held) if held == tick => Some(self.slot(index)),
            _ => None,
        }
    }

    fn slot_tick(&self, tick: Tick) -> Option<Tick> {
        self.tags[self.tick_to_index(tick)]
    }

    fn clear(&mut self) {
        self.data.fill(0);
        self.tags.fill(None);
        self.count = 0;
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn width(&self) -> usize {
        self.width
    }

    fn len(&self) -> usize {
        self.count
    }

    fn tick_range(&self) -> Option<(Tick, Tick)> {
        let mut ticks = self.tags.iter().flatten().copied();
        let first = ticks.next()?;
        Some(ticks.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }
}

/// Statistics about an input ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingStats {
    /// Number of slots
    pub capacity: usize,
    /// Slots currently holding a record
    pub count: usize,
    /// Oldest tick in the ring
    pub oldest_tick: Tick,
    /// Newest tick in the ring
    pub newest_tick: Tick,
}

impl RingStats {
    /// Get the tick span (newest - oldest)
    pub fn tick_span(&self) -> Tick {
        if self.count == 0 {
            0
        } else {
            self.newest_tick - self.oldest_tick
        }
    }

    /// Get the fill percentage (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f32 {
        self.count as f32 / self.capacity as f32
    }
}
