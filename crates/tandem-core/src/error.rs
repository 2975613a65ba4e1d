//! Error types for tandem-core

use crate::Tick;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A record of the wrong width was supplied
    #[error("Record size mismatch: expected {expected} bytes, got {got}")]
    RecordSize { expected: usize, got: usize },

    /// Input history only stores non-negative ticks
    #[error("Negative tick {0} cannot be stored")]
    NegativeTick(Tick),

    /// Records must be at least one byte wide
    #[error("Record width must be greater than 0")]
    ZeroWidth,

    /// Histories must hold at least one slot
    #[error("Capacity must be greater than 0")]
    ZeroCapacity,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
