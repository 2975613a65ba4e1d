//! Tandem Sync - Rollback synchronization for two peers
//!
//! This crate keeps a deterministic simulation consistent between two peers
//! whose inputs reach each other with variable latency:
//!
//! - **Input delay**: local inputs take effect `delay` ticks after they are
//!   submitted, hiding most of the network latency
//! - **Prediction**: when the remote input for a tick is late, the last one
//!   received stands in for it
//! - **Rollback**: once real remote input arrives, the confirmed baseline is
//!   stepped forward and the predicted ticks are replayed
//! - **Backpressure**: if the remote stalls for more than `max_desync_ticks`,
//!   the engine freezes instead of predicting without bound; a full local
//!   ring refuses new input until confirmation frees a slot
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                         Host                               │
//! │  local input ──▶ submit_local        transport ──▶ submit_remote
//! │                      │                                │    │
//! │                      ▼                                ▼    │
//! │              ┌──────────────┐                ┌──────────────┐
//! │              │  local ring  │                │ remote ring  │
//! │              └──────┬───────┘                └──────┬───────┘
//! │                     └──────────┐     ┌──────────────┘      │
//! │                                ▼     ▼                     │
//! │   DesyncGuard ──▶  tick  ──▶ step(state, a, b) ──▶ state   │
//! │                     ▲    confirmed ◀──▶ working            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never touches the network, never serializes anything and never
//! looks inside a state or input. Relaying local inputs to the peer is the
//! host's job.

mod config;
mod desync;
mod engine;
mod error;
mod snapshot;
mod stats;

#[cfg(test)]
mod properties;
#[cfg(test)]
mod testing;

pub use config::{
    SyncConfig, DEFAULT_MAX_DESYNC_TICKS, DEFAULT_RING_MULTIPLIER, MAX_DELAY, MAX_RING_MULTIPLIER,
};
pub use desync::DesyncGuard;
pub use engine::{LocalAccept, RemoteAccept, SyncEngine, TickOutcome};
pub use error::{Error, Result};
pub use snapshot::Snapshots;
pub use stats::SyncStats;

// Re-export the shared vocabulary for convenience
pub use tandem_core::{InputHistory, Record, Side, StepFunction, Tick};
pub use tandem_ring::{InputRing, RingStats};
