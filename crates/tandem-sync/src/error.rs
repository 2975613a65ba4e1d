//! Error types for tandem-sync

use tandem_core::{Side, Tick};
use thiserror::Error;

/// Sync error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration rejected at construction
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// State buffer handed to the engine has the wrong width
    #[error("State size mismatch: expected {expected} bytes, got {got}")]
    StateSize { expected: usize, got: usize },

    /// Input record handed to the engine has the wrong width
    #[error("Input size mismatch: expected {expected} bytes, got {got}")]
    InputSize { expected: usize, got: usize },

    /// Writing this input would overwrite a record the engine still needs
    #[error("{side} input for tick {tick} would overwrite unconsumed tick {evicted}")]
    InputOverrun { side: Side, tick: Tick, evicted: Tick },

    /// A record the engine needs has already been overwritten or never arrived
    #[error("{side} input for tick {tick} is no longer buffered")]
    StaleInput { side: Side, tick: Tick },

    /// Remote delivery went backwards
    #[error("Remote tick {tick} arrived after tick {latest}")]
    RemoteTickRegressed { tick: Tick, latest: Tick },

    /// Remote delivery skipped ticks
    #[error("Remote tick {tick} skips ahead, expected {expected}")]
    RemoteTickGap { tick: Tick, expected: Tick },

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] tandem_core::Error),

    /// RON parse error
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the call can simply be retried after the engine advances.
    ///
    /// Overruns clear once the confirmed tick moves past the evicted record.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::InputOverrun { .. })
    }
}

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, Error>;
