//! The rollback synchronization engine
//!
//! One `SyncEngine` keeps a deterministic simulation in step with one remote
//! peer. Every frame the host submits its local input, forwards whatever
//! remote inputs the transport delivered, and calls [`SyncEngine::tick`] to
//! get the best state available for the next tick.
//!
//! # Tick bookkeeping
//!
//! ```text
//!   confirmed_tick        remote_tick          current_tick        local_tick
//!        │                     │                     │                  │
//!  ──────┼─────────────────────┼─────────────────────┼──────────────────┼───▶
//!        │◀── real remote ────▶│◀── predicted ──────▶│◀── input delay ─▶│
//! ```
//!
//! - Ticks up to `confirmed_tick` were stepped with real inputs from both
//!   sides; the confirmed snapshot holds the state after that tick.
//! - Ticks after `remote_tick` use the last remote record received as a guess.
//! - Each `tick` call first steps the confirmed snapshot forward with any
//!   remote records that arrived and, if that overtook predictions, replays
//!   the working state from it.
//! - Local inputs are stamped `delay` ticks into the future, so
//!   `local_tick` runs ahead of `current_tick`.
//!
//! # Backpressure
//!
//! Two things stop progress without an error. The desync guard freezes the
//! engine once `current_tick` runs more than `max_desync_ticks` past
//! `remote_tick`. Independently, a local input whose ring slot still holds an
//! unconfirmed tick is refused, and `tick` waits for it instead of stepping
//! without one. Both clear as soon as enough remote input arrives.
//!
//! # Example
//!
//! ```
//! use tandem_sync::{LocalAccept, SyncConfig, SyncEngine, TickOutcome};
//!
//! let step = |state: &mut [u8], a: &[u8], b: &[u8]| {
//!     state[0] = state[0].wrapping_add(a[0]).wrapping_sub(b[0]);
//! };
//! let config = SyncConfig::new(1, 1, 2);
//! let mut engine = SyncEngine::new(config, &[0], step).unwrap();
//! let mut state = [0u8];
//!
//! for frame in 1..=4u8 {
//!     // Stamp the local input and hand the same tick to the transport
//!     let LocalAccept::Stored(tick) = engine.submit_local(&[frame]).unwrap() else {
//!         unreachable!("remote keeps up in this example");
//!     };
//!     // Pretend the remote peer's input for the same tick arrived already
//!     engine.submit_remote(tick, &[1]).unwrap();
//!
//!     let outcome = engine.tick(&mut state).unwrap();
//!     if frame == 1 {
//!         assert_eq!(outcome, TickOutcome::WarmUp);
//!     } else {
//!         assert_eq!(outcome, TickOutcome::Confirmed);
//!     }
//! }
//! // Ticks 0..=2 applied: (0 - 0) + (1 - 1) + (2 - 1)
//! assert_eq!(state, [1]);
//! ```

use crate::config::SyncConfig;
use crate::desync::DesyncGuard;
use crate::snapshot::Snapshots;
use crate::stats::SyncStats;
use crate::{Error, Result};
use log::{debug, info, trace, warn};
use std::fmt;
use tandem_core::{apply_step, InputHistory, Record, Side, StepFunction, Tick};
use tandem_ring::InputRing;

/// What a call to [`SyncEngine::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Progress is held back, by the desync guard or because the local input
    /// for the next tick was refused; the state buffer was not touched
    Frozen,
    /// Still inside the input-delay window; the caller's state was pinned
    /// as the baseline and not written
    WarmUp,
    /// The state written back used only real inputs
    Confirmed,
    /// The state written back relies on `depth` ticks of predicted remote input
    Predicted {
        /// Ticks past the last received remote input
        depth: u64,
    },
}

impl TickOutcome {
    /// Whether `current_tick` moved
    pub fn advanced(&self) -> bool {
        !matches!(self, TickOutcome::Frozen)
    }

    /// Whether a new state was written to the caller's buffer
    pub fn produced_state(&self) -> bool {
        matches!(self, TickOutcome::Confirmed | TickOutcome::Predicted { .. })
    }
}

/// Result of a local input submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalAccept {
    /// Stored for this tick; send it to the remote peer stamped with it
    Stored(Tick),
    /// Refused under backpressure and dropped: either the desync guard is
    /// freezing the engine or the ring slot for the next tick still holds an
    /// unconfirmed input. Submit again next frame.
    Frozen,
}

/// Result of a remote input delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAccept {
    /// Stored and `remote_tick` advanced
    Stored,
    /// Same tick as the latest delivery; ignored
    Duplicate,
}

/// Two-peer rollback synchronization engine
///
/// Owns both input rings and both state snapshots for the session. The step
/// function is held by value; pass `&f` to keep ownership on the host side.
///
/// The engine has no internal locking. Hosts that receive remote inputs on a
/// different thread must serialize calls themselves.
pub struct SyncEngine<F> {
    config: SyncConfig,
    step: F,
    guard: DesyncGuard,
    local: InputRing,
    remote: InputRing,
    snapshots: Snapshots,
    /// Tick of the working state; starts at `-delay`
    current_tick: Tick,
    /// Last tick stepped with real inputs only; -1 until tick 0 runs
    confirmed_tick: Tick,
    /// Local write cursor
    local_tick: Tick,
    /// Latest remote tick received
    remote_tick: Tick,
    /// The last local submission was refused
    local_refused: bool,
    /// Frozen on the previous call, for logging transitions
    stalled: bool,
    stats: SyncStats,
}

impl<F: StepFunction> SyncEngine<F> {
    /// Create an engine for one session
    ///
    /// Fails if the configuration is out of range or `initial_state` is not
    /// `config.state_size` bytes.
    pub fn new(config: SyncConfig, initial_state: &[u8], step: F) -> Result<Self> {
        config.validate()?;
        if initial_state.len() != config.state_size {
            return Err(Error::StateSize {
                expected: config.state_size,
                got: initial_state.len(),
            });
        }

        let capacity = config.ring_capacity();
        if let Some(missing) = config.headroom_shortfall() {
            warn!(
                "input rings hold {} ticks, {} short of the worst-case desync window; \
                 local input will be refused before the desync guard freezes",
                capacity, missing
            );
        }

        let mut engine = Self {
            guard: DesyncGuard::new(config.max_desync_ticks),
            local: InputRing::new(capacity, config.input_size)?,
            remote: InputRing::new(capacity, config.input_size)?,
            snapshots: Snapshots::new(initial_state),
            current_tick: 0,
            confirmed_tick: 0,
            local_tick: 0,
            remote_tick: 0,
            local_refused: false,
            stalled: false,
            stats: SyncStats::default(),
            config,
            step,
        };
        engine.restart()?;

        info!(
            "sync engine created: state {}B, input {}B, delay {}, flip {}, max desync {}, ring {}",
            engine.config.state_size,
            engine.config.input_size,
            engine.config.delay,
            engine.config.flip,
            engine.config.max_desync_ticks,
            capacity
        );
        Ok(engine)
    }

    /// Start the session over from `initial_state`, keeping the configuration
    pub fn reset(&mut self, initial_state: &[u8]) -> Result<()> {
        self.check_state(initial_state.len())?;
        self.snapshots.pin(initial_state)?;
        self.restart()?;
        self.stats.reset();
        info!("sync engine reset at delay {}", self.config.delay);
        Ok(())
    }

    fn restart(&mut self) -> Result<()> {
        self.local.clear();
        self.remote.clear();
        // Tick 0 is an implicit all-zero input on both sides
        let zero = Record::zeroed(self.config.input_size);
        self.local.write(0, zero.as_bytes())?;
        self.remote.write(0, zero.as_bytes())?;

        self.current_tick = -Tick::from(self.config.delay);
        self.confirmed_tick = -1;
        self.local_tick = 0;
        self.remote_tick = 0;
        self.local_refused = false;
        self.stalled = false;
        Ok(())
    }

    /// Advance by one tick and write the best available state into `state`
    ///
    /// `state` must be `state_size` bytes. While warming up, its contents are
    /// read and pinned as the baseline instead. When frozen, the state buffer
    /// and `current_tick` stay as they are.
    ///
    /// Remote records delivered since the last call are confirmed first,
    /// even if the call then freezes or fails. `StaleInput` means a record
    /// this tick needs was never submitted or has been overwritten; it leaves
    /// `current_tick` and the working state untouched.
    ///
    /// # Panics
    ///
    /// If the remote tick has fallen more than one tick behind a fully
    /// confirmed engine. The remote delivery checks make this unreachable, so
    /// hitting it means the engine state is corrupt.
    pub fn tick(&mut self, state: &mut [u8]) -> Result<TickOutcome> {
        self.check_state(state.len())?;
        self.reconcile()?;

        if self.guard.is_frozen(self.remote_tick, self.current_tick) {
            if !self.stalled {
                warn!(
                    "freezing at tick {}: remote input stuck at tick {} (max desync {})",
                    self.current_tick,
                    self.remote_tick,
                    self.guard.max_desync_ticks()
                );
            }
            return Ok(self.hold());
        }

        let tick = self.current_tick + 1;
        if tick > self.local_tick && self.local_refused {
            if !self.stalled {
                warn!(
                    "holding at tick {}: local input was refused, waiting for remote input past tick {}",
                    self.current_tick, self.remote_tick
                );
            }
            return Ok(self.hold());
        }
        if self.stalled {
            info!(
                "resuming at tick {}: remote input reached tick {}",
                self.current_tick, self.remote_tick
            );
            self.stalled = false;
        }

        if tick < 0 {
            self.snapshots.pin(state)?;
            self.current_tick = tick;
            self.stats.ticks_advanced += 1;
            self.stats.warm_up_ticks += 1;
            trace!("warm-up tick {}", tick);
            return Ok(TickOutcome::WarmUp);
        }

        self.ensure_inputs(tick)?;
        if self.confirmed_tick == self.current_tick {
            self.advance(tick)?;
        } else {
            self.predict(tick);
        }
        self.current_tick = tick;
        self.stats.ticks_advanced += 1;
        self.snapshots.emit(state)?;

        let depth = (tick - self.remote_tick).max(0) as u64;
        if depth == 0 {
            self.stats.confirmed_ticks += 1;
            Ok(TickOutcome::Confirmed)
        } else {
            self.stats.predicted_ticks += 1;
            self.stats.record_prediction_depth(depth);
            Ok(TickOutcome::Predicted { depth })
        }
    }

    fn hold(&mut self) -> TickOutcome {
        self.stalled = true;
        self.stats.frozen_ticks += 1;
        TickOutcome::Frozen
    }

    /// Check the records stepping `tick` will read
    fn ensure_inputs(&self, tick: Tick) -> Result<()> {
        if !self.local.contains(tick) {
            return Err(Error::StaleInput {
                side: Side::Local,
                tick,
            });
        }
        let remote_t = self.remote_tick.min(tick);
        if !self.remote.contains(remote_t) {
            return Err(Error::StaleInput {
                side: Side::Remote,
                tick: remote_t,
            });
        }
        Ok(())
    }

    /// Confirm every tick up to `current_tick` that real remote input now
    /// covers, then rebuild the working state from the new baseline
    fn reconcile(&mut self) -> Result<()> {
        let target = self.remote_tick.min(self.current_tick);
        if target <= self.confirmed_tick {
            return Ok(());
        }

        let first = self.confirmed_tick + 1;
        if let Some(missing) = (first..=self.current_tick).find(|t| !self.local.contains(*t)) {
            return Err(Error::StaleInput {
                side: Side::Local,
                tick: missing,
            });
        }
        if let Some(missing) = (first..=target).find(|t| !self.remote.contains(*t)) {
            return Err(Error::StaleInput {
                side: Side::Remote,
                tick: missing,
            });
        }

        let flip = self.config.flip;
        for t in first..=target {
            apply_step(
                &self.step,
                flip,
                self.snapshots.confirmed_mut(),
                self.local.read(t),
                self.remote.read(t),
            );
        }
        self.confirmed_tick = target;
        trace!("confirmed ticks {}..={}", first, target);

        // Predictions past the new baseline reuse the latest remote record
        self.snapshots.restore()?;
        let replay = target + 1..=self.current_tick;
        let steps = replay.clone().count() as u64;
        for t in replay {
            apply_step(
                &self.step,
                flip,
                self.snapshots.working_mut(),
                self.local.read(t),
                self.remote.read(self.remote_tick),
            );
        }

        self.stats.rollbacks += 1;
        self.stats.resimulated_steps += steps;
        debug!(
            "rolled back to tick {} and replayed {} ticks to {} (remote at {})",
            target, steps, self.current_tick, self.remote_tick
        );
        Ok(())
    }

    /// No prediction open: step the working state with real input, or start
    /// predicting if this tick's remote record is missing
    fn advance(&mut self, tick: Tick) -> Result<()> {
        let flip = self.config.flip;

        if self.remote_tick >= tick {
            apply_step(
                &self.step,
                flip,
                self.snapshots.working_mut(),
                self.local.read(tick),
                self.remote.read(tick),
            );
            self.confirmed_tick = tick;
            trace!("stepped tick {} with real inputs", tick);
        } else {
            assert_eq!(
                self.remote_tick,
                tick - 1,
                "remote tick fell behind a fully confirmed engine at tick {}",
                tick
            );
            // First missing remote input: keep the baseline, then guess
            self.snapshots.stash()?;
            apply_step(
                &self.step,
                flip,
                self.snapshots.working_mut(),
                self.local.read(tick),
                self.remote.read(self.remote_tick),
            );
            debug!("predicting from tick {}: remote input missing", tick);
        }
        Ok(())
    }

    /// Prediction already open and no new remote input: extend it by one tick
    fn predict(&mut self, tick: Tick) {
        apply_step(
            &self.step,
            self.config.flip,
            self.snapshots.working_mut(),
            self.local.read(tick),
            self.remote.read(self.remote_tick),
        );
        trace!("predicted tick {} from remote tick {}", tick, self.remote_tick);
    }

    /// Queue the newest local input
    ///
    /// The write cursor advances one tick per call unless the engine applies
    /// backpressure, in which case the input is dropped and
    /// `LocalAccept::Frozen` returned: either the desync guard is freezing
    /// progress (the record for the cursor tick may already be on its way to
    /// the remote peer), or the ring slot for the next tick still holds a
    /// local input the engine has not confirmed.
    pub fn submit_local(&mut self, record: &[u8]) -> Result<LocalAccept> {
        self.check_input(record.len())?;

        if self.guard.is_frozen(self.remote_tick, self.current_tick) {
            trace!("dropping local input while frozen at tick {}", self.current_tick);
            return Ok(self.refuse_local());
        }

        let tick = self.local_tick + 1;
        if let Some(evicted) = self.unconfirmed_eviction(&self.local, tick) {
            debug!(
                "local input ring full: tick {} waits for tick {} to be confirmed",
                tick, evicted
            );
            return Ok(self.refuse_local());
        }

        self.local.write(tick, record)?;
        self.local_tick = tick;
        self.local_refused = false;
        self.stats.local_inputs += 1;
        Ok(LocalAccept::Stored(tick))
    }

    fn refuse_local(&mut self) -> LocalAccept {
        self.local_refused = true;
        self.stats.dropped_local_inputs += 1;
        LocalAccept::Frozen
    }

    /// Record an input delivered from the remote peer
    ///
    /// Deliveries must be ordered and gap-free: `tick` must be the latest
    /// remote tick plus one. A repeat of the latest tick is ignored as a
    /// re-delivery. `InputOverrun` means the record would replace one the
    /// engine has not confirmed yet; it is retryable once the engine has
    /// ticked.
    pub fn submit_remote(&mut self, tick: Tick, record: &[u8]) -> Result<RemoteAccept> {
        self.check_input(record.len())?;

        if tick == self.remote_tick {
            debug!("ignoring duplicate remote input for tick {}", tick);
            self.stats.duplicate_remote_inputs += 1;
            return Ok(RemoteAccept::Duplicate);
        }
        if tick < self.remote_tick {
            warn!(
                "rejecting remote input for tick {}: already have tick {}",
                tick, self.remote_tick
            );
            return Err(Error::RemoteTickRegressed {
                tick,
                latest: self.remote_tick,
            });
        }
        let expected = self.remote_tick + 1;
        if tick > expected {
            warn!(
                "rejecting remote input for tick {}: expected tick {}",
                tick, expected
            );
            return Err(Error::RemoteTickGap { tick, expected });
        }

        if let Some(evicted) = self.unconfirmed_eviction(&self.remote, tick) {
            warn!(
                "remote input ring overrun: tick {} would replace unconfirmed tick {}",
                tick, evicted
            );
            return Err(Error::InputOverrun {
                side: Side::Remote,
                tick,
                evicted,
            });
        }
        self.remote.write(tick, record)?;
        self.remote_tick = tick;
        self.stats.remote_inputs += 1;
        Ok(RemoteAccept::Stored)
    }

    fn check_state(&self, got: usize) -> Result<()> {
        if got != self.config.state_size {
            return Err(Error::StateSize {
                expected: self.config.state_size,
                got,
            });
        }
        Ok(())
    }

    fn check_input(&self, got: usize) -> Result<()> {
        if got != self.config.input_size {
            return Err(Error::InputSize {
                expected: self.config.input_size,
                got,
            });
        }
        Ok(())
    }
}

impl<F> SyncEngine<F> {
    /// The session configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Configured input delay
    pub fn delay(&self) -> u8 {
        self.config.delay
    }

    /// Tick of the working state
    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    /// Last tick stepped with real inputs only (-1 before tick 0)
    pub fn confirmed_tick(&self) -> Tick {
        self.confirmed_tick
    }

    /// Tick of the newest local input
    pub fn local_tick(&self) -> Tick {
        self.local_tick
    }

    /// Tick of the newest remote input
    pub fn remote_tick(&self) -> Tick {
        self.remote_tick
    }

    /// Whether the desync guard blocks the next tick
    pub fn is_frozen(&self) -> bool {
        self.guard.is_frozen(self.remote_tick, self.current_tick)
    }

    /// Whether the next local input would be refused because its ring slot
    /// still holds an unconfirmed tick
    pub fn is_local_ring_full(&self) -> bool {
        self.unconfirmed_eviction(&self.local, self.local_tick + 1)
            .is_some()
    }

    /// Ticks of predicted remote input in the working state
    pub fn prediction_depth(&self) -> u64 {
        if self.current_tick < 0 {
            0
        } else {
            (self.current_tick - self.remote_tick).max(0) as u64
        }
    }

    /// The working state, as last written by `tick`
    pub fn state(&self) -> &[u8] {
        self.snapshots.working()
    }

    /// The state after `confirmed_tick`
    ///
    /// While no prediction is open, the working state is the confirmed state.
    pub fn confirmed_state(&self) -> &[u8] {
        if self.confirmed_tick >= self.current_tick {
            self.snapshots.working()
        } else {
            self.snapshots.confirmed()
        }
    }

    /// Debug counters
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// The local input ring
    pub fn local_inputs(&self) -> &InputRing {
        &self.local
    }

    /// The remote input ring
    pub fn remote_inputs(&self) -> &InputRing {
        &self.remote
    }

    /// The live tick a write at `tick` would replace, if it is not confirmed
    fn unconfirmed_eviction(&self, ring: &InputRing, tick: Tick) -> Option<Tick> {
        ring.would_evict(tick)
            .filter(|evicted| *evicted > self.confirmed_tick)
    }
}

impl<F> fmt::Debug for SyncEngine<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("current_tick", &self.current_tick)
            .field("confirmed_tick", &self.confirmed_tick)
            .field("local_tick", &self.local_tick)
            .field("remote_tick", &self.remote_tick)
            .field("delay", &self.config.delay)
            .field("flip", &self.config.flip)
            .finish()
    }
}
