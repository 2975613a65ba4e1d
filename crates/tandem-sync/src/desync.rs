//! Desync backpressure
//!
//! When the remote peer stops delivering inputs, the local engine could keep
//! predicting forever. The guard caps how far `current_tick` may run ahead of
//! the last remote tick; past that point ticks and local submissions stall
//! until the remote catches up again.

use tandem_core::Tick;

/// Freezes progress once the local tick outruns the remote tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesyncGuard {
    max_desync_ticks: Tick,
}

impl DesyncGuard {
    /// Create a guard that tolerates `max_desync_ticks` ticks of desync
    pub fn new(max_desync_ticks: u32) -> Self {
        Self {
            max_desync_ticks: Tick::from(max_desync_ticks),
        }
    }

    /// The configured threshold
    pub fn max_desync_ticks(&self) -> Tick {
        self.max_desync_ticks
    }

    /// How many ticks `current_tick` is ahead of `remote_tick`
    ///
    /// Negative while the remote is ahead.
    pub fn desync(&self, remote_tick: Tick, current_tick: Tick) -> Tick {
        current_tick - remote_tick
    }

    /// Whether progress must stall
    ///
    /// ```
    /// use tandem_sync::DesyncGuard;
    ///
    /// let guard = DesyncGuard::new(16);
    /// assert!(!guard.is_frozen(0, 16));
    /// assert!(guard.is_frozen(0, 17));
    /// ```
    pub fn is_frozen(&self, remote_tick: Tick, current_tick: Tick) -> bool {
        remote_tick + self.max_desync_ticks < current_tick
    }
}
