//! Two Peers Example
//!
//! Runs two rollback peers in one process. Each peer feeds scripted input to
//! its own engine and sends it over a simulated link with latency and jitter.
//! Peer two runs flipped so both call the same step function with player
//! one's input first. At the end the confirmed states of both peers are
//! compared tick by tick.
//!
//! Pass a RON file (see `two_peers.ron`) to change the scenario. Set
//! `RUST_LOG=debug` to watch predictions and rollbacks.

mod game;
mod link;
mod rng;

use game::{Controller, INPUT_SIZE, STATE_SIZE};
use link::{InputPacket, Link};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::error::Error;
use tandem_sync::{LocalAccept, SyncConfig, SyncEngine, Tick, TickOutcome};

type Step = fn(&mut [u8], &[u8], &[u8]);
type DemoResult<T> = Result<T, Box<dyn Error>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DemoConfig {
    frames: u64,
    latency: u32,
    jitter: u32,
    seed: u64,
    sync: SyncConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 180,
            latency: 2,
            jitter: 3,
            seed: 42,
            sync: SyncConfig::new(STATE_SIZE, INPUT_SIZE, 2),
        }
    }
}

impl DemoConfig {
    fn load() -> DemoResult<Self> {
        match std::env::args().nth(1) {
            Some(path) => {
                let text = std::fs::read_to_string(&path)?;
                let config: DemoConfig = ron::from_str(&text)?;
                config.sync.validate()?;
                info!("loaded scenario from {}", path);
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }
}

/// One side of the session
struct Peer {
    name: &'static str,
    engine: SyncEngine<Step>,
    state: [u8; STATE_SIZE],
    controller: Controller,
    pending: VecDeque<InputPacket>,
    confirmed: BTreeMap<Tick, [u8; STATE_SIZE]>,
    predicted_frames: u64,
}

impl Peer {
    fn new(name: &'static str, config: SyncConfig, seed: u64) -> DemoResult<Self> {
        let initial = game::initial_state();
        Ok(Self {
            name,
            engine: SyncEngine::new(config, &initial, game::step as Step)?,
            state: initial,
            controller: Controller::new(seed),
            pending: VecDeque::new(),
            confirmed: BTreeMap::new(),
            predicted_frames: 0,
        })
    }

    /// Read the controller and send the input if the engine took it
    fn poll_input(&mut self, now: u64, out: &mut Link) -> DemoResult<()> {
        let input = self.controller.poll();
        if let LocalAccept::Stored(tick) = self.engine.submit_local(&input)? {
            out.send(
                now,
                &InputPacket {
                    tick,
                    payload: input.to_vec(),
                },
            )?;
        }
        Ok(())
    }

    /// Hand every arrived packet to the engine, keeping the ones it cannot
    /// take yet
    fn receive(&mut self, now: u64, incoming: &mut Link) -> DemoResult<()> {
        self.pending.extend(incoming.receive(now)?);
        while let Some(packet) = self.pending.front() {
            match self.engine.submit_remote(packet.tick, &packet.payload) {
                Ok(_) => {
                    self.pending.pop_front();
                }
                Err(err) if err.is_retryable() => break,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    fn tick(&mut self) -> DemoResult<TickOutcome> {
        let outcome = self.engine.tick(&mut self.state)?;
        if let TickOutcome::Predicted { .. } = outcome {
            self.predicted_frames += 1;
        }
        let confirmed = self.engine.confirmed_tick();
        if confirmed >= 0 && !self.confirmed.contains_key(&confirmed) {
            let mut snapshot = [0u8; STATE_SIZE];
            snapshot.copy_from_slice(self.engine.confirmed_state());
            self.confirmed.insert(confirmed, snapshot);
        }
        Ok(outcome)
    }

    fn report(&self) {
        let stats = self.engine.stats();
        println!("{}:", self.name);
        println!("  final state:      {}", game::describe(&self.state));
        println!(
            "  ticks:            current {}, confirmed {}, remote {}",
            self.engine.current_tick(),
            self.engine.confirmed_tick(),
            self.engine.remote_tick()
        );
        println!(
            "  frames:           {} confirmed, {} predicted, {} frozen",
            stats.confirmed_ticks, self.predicted_frames, stats.frozen_ticks
        );
        println!(
            "  local inputs:     {} sent, {} refused",
            stats.local_inputs, stats.dropped_local_inputs
        );
        println!(
            "  rollbacks:        {} ({} steps replayed, deepest prediction {})",
            stats.rollbacks, stats.resimulated_steps, stats.max_prediction_depth
        );
    }
}

fn run(config: DemoConfig) -> DemoResult<()> {
    println!("=== Tandem Two Peers Example ===\n");
    println!(
        "delay {}, latency {} + up to {} frames jitter, {} frames\n",
        config.sync.delay, config.latency, config.jitter, config.frames
    );

    let mut one = Peer::new("peer one", config.sync.clone(), config.seed)?;
    let mut two = Peer::new(
        "peer two",
        config.sync.clone().with_flip(true),
        config.seed.wrapping_mul(31).wrapping_add(1),
    )?;
    let mut one_to_two = Link::new(config.latency, config.jitter, config.seed ^ 0xa5a5);
    let mut two_to_one = Link::new(config.latency, config.jitter, config.seed ^ 0x5a5a);

    for now in 0..config.frames {
        one.poll_input(now, &mut one_to_two)?;
        two.poll_input(now, &mut two_to_one)?;
        one.receive(now, &mut two_to_one)?;
        two.receive(now, &mut one_to_two)?;
        one.tick()?;
        two.tick()?;

        if now % 60 == 59 {
            println!("frame {:>4}: {}", now + 1, game::describe(&one.state));
        }
    }
    println!();

    one.report();
    two.report();
    let (packets, bytes) = one_to_two.totals();
    println!("\nlink one -> two: {} packets, {} bytes", packets, bytes);

    let mut agreed = 0;
    for (tick, state) in &one.confirmed {
        if let Some(other) = two.confirmed.get(tick) {
            if other != state {
                return Err(format!("peers disagree at confirmed tick {}", tick).into());
            }
            agreed += 1;
        }
    }
    println!("confirmed states agree on {} shared ticks", agreed);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = DemoConfig::load().and_then(run);
    if let Err(err) = result {
        error!("{}", err);
        std::process::exit(1);
    }
}
