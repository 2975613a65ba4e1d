//! Session configuration
//!
//! A `SyncConfig` fixes everything about a session that cannot change once
//! the engine is running: record widths, input delay, operand order, the
//! desync threshold and how many ticks of input history to keep.
//!
//! Configs are plain serde structs and round-trip through RON:
//!
//! ```
//! use tandem_sync::SyncConfig;
//!
//! let config = SyncConfig::from_ron_str(
//!     "(state_size: 8, input_size: 4, delay: 3, flip: true)",
//! ).unwrap();
//! assert_eq!(config.max_desync_ticks, 16);
//! assert_eq!(config.ring_capacity(), 24);
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Input delay must stay below this many ticks
pub const MAX_DELAY: u8 = 16;

/// How far the local tick may run past the last remote tick before freezing
pub const DEFAULT_MAX_DESYNC_TICKS: u32 = 16;

/// Ring capacity is `delay` times this
pub const DEFAULT_RING_MULTIPLIER: u32 = 8;

/// Upper bound accepted for `ring_multiplier`
pub const MAX_RING_MULTIPLIER: u32 = 64;

/// Configuration for one synchronized session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Width of a state snapshot in bytes
    pub state_size: usize,
    /// Width of one input record in bytes
    pub input_size: usize,
    /// Input delay in ticks, `1..MAX_DELAY`
    pub delay: u8,
    /// Pass `(remote, local)` to the step function instead of `(local, remote)`
    #[serde(default)]
    pub flip: bool,
    /// Freeze once `current_tick` exceeds `remote_tick` by more than this
    #[serde(default = "default_max_desync_ticks")]
    pub max_desync_ticks: u32,
    /// Input ring capacity per tick of delay
    #[serde(default = "default_ring_multiplier")]
    pub ring_multiplier: u32,
}

fn default_max_desync_ticks() -> u32 {
    DEFAULT_MAX_DESYNC_TICKS
}

fn default_ring_multiplier() -> u32 {
    DEFAULT_RING_MULTIPLIER
}

impl SyncConfig {
    /// Create a configuration with default flip, desync and ring settings
    pub fn new(state_size: usize, input_size: usize, delay: u8) -> Self {
        Self {
            state_size,
            input_size,
            delay,
            flip: false,
            max_desync_ticks: DEFAULT_MAX_DESYNC_TICKS,
            ring_multiplier: DEFAULT_RING_MULTIPLIER,
        }
    }

    /// Set the operand flip
    pub fn with_flip(mut self, flip: bool) -> Self {
        self.flip = flip;
        self
    }

    /// Set the desync threshold
    pub fn with_max_desync_ticks(mut self, ticks: u32) -> Self {
        self.max_desync_ticks = ticks;
        self
    }

    /// Set the ring capacity multiplier
    pub fn with_ring_multiplier(mut self, multiplier: u32) -> Self {
        self.ring_multiplier = multiplier;
        self
    }

    /// Parse a configuration from RON and validate it
    pub fn from_ron_str(s: &str) -> Result<Self> {
        let config: SyncConfig = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Check every field against its supported range
    pub fn validate(&self) -> Result<()> {
        if self.state_size == 0 {
            return Err(Error::invalid_config("state_size", "must be at least 1 byte"));
        }
        if self.input_size == 0 {
            return Err(Error::invalid_config("input_size", "must be at least 1 byte"));
        }
        if self.delay == 0 || self.delay >= MAX_DELAY {
            return Err(Error::invalid_config(
                "delay",
                format!("must be in 1..{}, got {}", MAX_DELAY, self.delay),
            ));
        }
        if self.max_desync_ticks == 0 {
            return Err(Error::invalid_config("max_desync_ticks", "must be at least 1"));
        }
        if self.ring_multiplier == 0 || self.ring_multiplier > MAX_RING_MULTIPLIER {
            return Err(Error::invalid_config(
                "ring_multiplier",
                format!(
                    "must be in 1..={}, got {}",
                    MAX_RING_MULTIPLIER, self.ring_multiplier
                ),
            ));
        }
        Ok(())
    }

    /// Number of slots in each input ring
    pub fn ring_capacity(&self) -> usize {
        self.delay as usize * self.ring_multiplier as usize
    }

    /// Slots missing for the widest local window a stalled session can hold.
    ///
    /// While the remote peer stalls, every local input after the confirmed tick
    /// stays live. That window can grow to `delay + max_desync_ticks + 2` ticks
    /// before the guard stops the local cursor. Smaller rings still work, but
    /// local submissions may report overruns before the freeze kicks in.
    pub fn headroom_shortfall(&self) -> Option<usize> {
        let needed = self.delay as usize + self.max_desync_ticks as usize + 2;
        needed
            .checked_sub(self.ring_capacity())
            .filter(|missing| *missing > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let config = SyncConfig::new(8, 4, 2);
        assert!(!config.flip);
        assert_eq!(config.max_desync_ticks, DEFAULT_MAX_DESYNC_TICKS);
        assert_eq!(config.ring_multiplier, DEFAULT_RING_MULTIPLIER);
        assert_eq!(config.ring_capacity(), 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = SyncConfig::new(8, 4, 2)
            .with_flip(true)
            .with_max_desync_ticks(4)
            .with_ring_multiplier(3);
        assert!(config.flip);
        assert_eq!(config.max_desync_ticks, 4);
        assert_eq!(config.ring_capacity(), 6);
    }

    #[test]
    fn test_delay_bounds() {
        assert!(SyncConfig::new(8, 4, 0).validate().is_err());
        assert!(SyncConfig::new(8, 4, 1).validate().is_ok());
        assert!(SyncConfig::new(8, 4, 15).validate().is_ok());
        assert!(SyncConfig::new(8, 4, 16).validate().is_err());
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let err = SyncConfig::new(0, 4, 2).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { field: "state_size", .. }));

        let err = SyncConfig::new(8, 0, 2).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { field: "input_size", .. }));
    }

    #[test]
    fn test_desync_and_multiplier_bounds() {
        let config = SyncConfig::new(8, 4, 2).with_max_desync_ticks(0);
        assert!(config.validate().is_err());

        let config = SyncConfig::new(8, 4, 2).with_ring_multiplier(0);
        assert!(config.validate().is_err());

        let config = SyncConfig::new(8, 4, 2).with_ring_multiplier(MAX_RING_MULTIPLIER + 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_headroom_shortfall() {
        // 2 * 8 = 16 slots, window needs 2 + 16 + 2 = 20
        assert_eq!(SyncConfig::new(8, 4, 2).headroom_shortfall(), Some(4));
        // 3 * 8 = 24 slots, window needs 21
        assert_eq!(SyncConfig::new(8, 4, 3).headroom_shortfall(), None);
        // Tighter desync makes small delays fit
        let config = SyncConfig::new(8, 4, 2).with_max_desync_ticks(8);
        assert_eq!(config.headroom_shortfall(), None);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = SyncConfig::new(16, 2, 4).with_flip(true);
        let text = config.to_ron_string().unwrap();
        let parsed = SyncConfig::from_ron_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_ron_defaults_and_validation() {
        let config = SyncConfig::from_ron_str("(state_size: 4, input_size: 1, delay: 2)").unwrap();
        assert!(!config.flip);
        assert_eq!(config.ring_multiplier, 8);

        let err = SyncConfig::from_ron_str("(state_size: 4, input_size: 1, delay: 0)").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { field: "delay", .. }));

        let err = SyncConfig::from_ron_str("(state_size: 4,").unwrap_err();
        assert!(matches!(err, Error::Ron(_)));
    }
}
