//! Shared helpers for engine tests
//!
//! States are little-endian `i64`s and inputs little-endian `i32`s, so test
//! step functions can do ordinary arithmetic on them.

use crate::{LocalAccept, RemoteAccept, Result, SyncConfig, SyncEngine, TickOutcome};
use std::collections::BTreeMap;
use tandem_core::{apply_step, StepFunction, Tick};

pub(crate) const STATE: usize = 8;
pub(crate) const INPUT: usize = 4;

pub(crate) fn input(v: i32) -> [u8; INPUT] {
    v.to_le_bytes()
}

pub(crate) fn state(v: i64) -> [u8; STATE] {
    v.to_le_bytes()
}

pub(crate) fn value(state: &[u8]) -> i64 {
    let mut bytes = [0u8; STATE];
    bytes.copy_from_slice(state);
    i64::from_le_bytes(bytes)
}

fn decode(input: &[u8]) -> i64 {
    let mut bytes = [0u8; INPUT];
    bytes.copy_from_slice(input);
    i64::from(i32::from_le_bytes(bytes))
}

/// `s' = 3s + a - 2b`: sensitive to operand order and to how many times a
/// tick is applied
pub(crate) fn mix(state: &mut [u8], a: &[u8], b: &[u8]) {
    let next = value(state)
        .wrapping_mul(3)
        .wrapping_add(decode(a))
        .wrapping_sub(decode(b).wrapping_mul(2));
    state.copy_from_slice(&next.to_le_bytes());
}

/// `s' = s + a - b`
pub(crate) fn sub(state: &mut [u8], a: &[u8], b: &[u8]) {
    let next = value(state)
        .wrapping_add(decode(a))
        .wrapping_sub(decode(b));
    state.copy_from_slice(&next.to_le_bytes());
}

/// One engine plus a record of every input it accepted
pub(crate) struct Peer<F> {
    pub engine: SyncEngine<F>,
    pub state: [u8; STATE],
    step: F,
    initial: i64,
    local: BTreeMap<Tick, i32>,
    remote: BTreeMap<Tick, i32>,
}

impl<F: StepFunction + Copy> Peer<F> {
    pub fn new(config: SyncConfig, initial: i64, step: F) -> Self {
        let engine = SyncEngine::new(config, &state(initial), step).unwrap();
        Self {
            engine,
            state: state(initial),
            step,
            initial,
            local: BTreeMap::new(),
            remote: BTreeMap::new(),
        }
    }

    pub fn submit_local(&mut self, v: i32) -> LocalAccept {
        let accept = self.engine.submit_local(&input(v)).unwrap();
        if let LocalAccept::Stored(tick) = accept {
            self.local.insert(tick, v);
        }
        accept
    }

    pub fn deliver(&mut self, tick: Tick, v: i32) -> Result<RemoteAccept> {
        let accept = self.engine.submit_remote(tick, &input(v))?;
        if accept == RemoteAccept::Stored {
            self.remote.insert(tick, v);
        }
        Ok(accept)
    }

    pub fn tick(&mut self) -> TickOutcome {
        self.engine.tick(&mut self.state).unwrap()
    }

    pub fn value(&self) -> i64 {
        value(&self.state)
    }

    /// State after `upto`, stepping every tick directly and standing in the
    /// remote input of `remote_tick` for every later tick
    pub fn expected_at(&self, upto: Tick, remote_tick: Tick) -> i64 {
        let flip = self.engine.config().flip;
        let mut s = state(self.initial);
        for t in 0..=upto {
            let l = self.local.get(&t).copied().unwrap_or(0);
            let r = self.remote.get(&t.min(remote_tick)).copied().unwrap_or(0);
            apply_step(&self.step, flip, &mut s, &input(l), &input(r));
        }
        value(&s)
    }

    /// What the engine should be showing right now
    pub fn expected(&self) -> i64 {
        self.expected_at(self.engine.current_tick(), self.engine.remote_tick())
    }
}
