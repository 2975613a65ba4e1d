//! In-memory stand-in for a reliable, ordered network channel

use crate::rng::XorShift;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tandem_sync::Tick;

/// One local input on the wire, stamped with the tick it applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPacket {
    pub tick: Tick,
    pub payload: Vec<u8>,
}

impl InputPacket {
    pub fn encode(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(bytes)
    }
}

/// One direction of a connection with a base latency plus random jitter,
/// measured in frames. Packets never overtake each other.
pub struct Link {
    latency: u32,
    jitter: u32,
    rng: XorShift,
    in_flight: VecDeque<(u64, Vec<u8>)>,
    sent: u64,
    bytes: u64,
}

impl Link {
    pub fn new(latency: u32, jitter: u32, seed: u64) -> Self {
        Self {
            latency,
            jitter,
            rng: XorShift::new(seed),
            in_flight: VecDeque::new(),
            sent: 0,
            bytes: 0,
        }
    }

    pub fn send(&mut self, now: u64, packet: &InputPacket) -> bincode::Result<()> {
        let bytes = packet.encode()?;
        let delay = u64::from(self.latency) + self.rng.range(0, i64::from(self.jitter)) as u64;
        let arrival = self
            .in_flight
            .back()
            .map_or(now + delay, |(last, _)| (*last).max(now + delay));
        self.sent += 1;
        self.bytes += bytes.len() as u64;
        self.in_flight.push_back((arrival, bytes));
        Ok(())
    }

    /// Everything that has arrived by frame `now`, in send order
    pub fn receive(&mut self, now: u64) -> bincode::Result<Vec<InputPacket>> {
        let mut arrived = Vec::new();
        while let Some((arrival, _)) = self.in_flight.front() {
            if *arrival > now {
                break;
            }
            if let Some((_, bytes)) = self.in_flight.pop_front() {
                arrived.push(InputPacket::decode(&bytes)?);
            }
        }
        Ok(arrived)
    }

    /// Packets and payload bytes sent so far
    pub fn totals(&self) -> (u64, u64) {
        (self.sent, self.bytes)
    }
}
