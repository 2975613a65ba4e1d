//! Randomized checks of the engine against direct stepping
//!
//! Each case drives one engine through a random local input stream and a
//! random, bursty remote delivery schedule. The remote side never delivers a
//! tick before the frame it was produced on.

use crate::testing::{mix, Peer, INPUT, STATE};
use crate::{Error, LocalAccept, SyncConfig, TickOutcome, DEFAULT_RING_MULTIPLIER};
use proptest::prelude::*;
use tandem_core::Tick;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    outcome: TickOutcome,
    state: i64,
    expected: i64,
    current_tick: Tick,
    remote_tick: Tick,
}

fn per_tick(values: &[i16], tick: Tick) -> i32 {
    i32::from(values[(tick - 1) as usize % values.len()])
}

/// Frames appended after the schedule, with the remote sending everything
/// it has each frame
const RECOVERY_FRAMES: usize = 12;

/// Drive one engine; local tick `t` carries `ours[t - 1]` and remote tick
/// `t` carries `theirs[t - 1]`, wrapping around both lists
fn run(config: SyncConfig, ours: &[i16], theirs: &[i16], schedule: &[usize]) -> Vec<Frame> {
    let mut peer = Peer::new(config, 17, mix);
    let mut next_remote: Tick = 1;
    let mut frames = Vec::with_capacity(schedule.len());

    let recovery = std::iter::repeat(usize::MAX).take(RECOVERY_FRAMES);
    for (frame, deliveries) in schedule.iter().copied().chain(recovery).enumerate() {
        let frame = frame as Tick + 1;

        let next_local = peer.engine.local_tick() + 1;
        match peer.submit_local(per_tick(ours, next_local)) {
            LocalAccept::Stored(tick) => assert_eq!(tick, next_local),
            LocalAccept::Frozen => {
                assert!(peer.engine.is_frozen() || peer.engine.is_local_ring_full())
            }
        }

        for _ in 0..deliveries {
            if next_remote > frame {
                break;
            }
            match peer.deliver(next_remote, per_tick(theirs, next_remote)) {
                Ok(_) => next_remote += 1,
                // Retried on a later frame once the engine has caught up
                Err(Error::InputOverrun { .. }) => break,
                Err(err) => panic!("delivery of tick {} failed: {}", next_remote, err),
            }
        }

        let outcome = peer.tick();
        frames.push(Frame {
            outcome,
            state: peer.value(),
            expected: if outcome.produced_state() {
                peer.expected()
            } else {
                peer.value()
            },
            current_tick: peer.engine.current_tick(),
            remote_tick: peer.engine.remote_tick(),
        });
    }
    frames
}

fn config(delay: u8, max_desync: u32, multiplier: u32, flip: bool) -> SyncConfig {
    SyncConfig::new(STATE, INPUT, delay)
        .with_max_desync_ticks(max_desync)
        .with_ring_multiplier(multiplier)
        .with_flip(flip)
}

fn check_against_direct_stepping(frames: &[Frame], max_desync: u32) -> Result<(), TestCaseError> {
    for (i, frame) in frames.iter().enumerate() {
        prop_assert_eq!(frame.state, frame.expected, "frame {} ({:?})", i + 1, frame.outcome);
        prop_assert!(frame.current_tick <= frame.remote_tick + Tick::from(max_desync) + 1);
        if let TickOutcome::Predicted { depth } = frame.outcome {
            prop_assert_eq!(depth as Tick, frame.current_tick - frame.remote_tick);
        }
    }
    // Once the remote sends everything it has, the engine is back to real input
    let tail = &frames[frames.len() - 4..];
    prop_assert!(
        tail.iter().all(|f| f.outcome == TickOutcome::Confirmed),
        "no recovery: {:?}",
        tail
    );
    Ok(())
}

proptest! {
    #[test]
    fn every_state_matches_direct_stepping(
        delay in 1u8..6,
        max_desync in 2u32..12,
        ours in prop::collection::vec(any::<i16>(), 40..80),
        theirs in prop::collection::vec(any::<i16>(), 40..80),
        schedule in prop::collection::vec(0usize..4, 40..120),
    ) {
        let frames = run(config(delay, max_desync, 32, false), &ours, &theirs, &schedule);
        check_against_direct_stepping(&frames, max_desync)?;
    }

    #[test]
    fn default_ring_sizing_survives_stalls(
        delay in 1u8..6,
        max_desync in 2u32..=16,
        ours in prop::collection::vec(any::<i16>(), 40..80),
        theirs in prop::collection::vec(any::<i16>(), 40..80),
        mut schedule in prop::collection::vec(0usize..4, 60..120),
        stall_start in 5usize..30,
        stall_len in 10usize..40,
    ) {
        // A long silence followed by the normal bursty schedule
        let stall_end = (stall_start + stall_len).min(schedule.len());
        schedule[stall_start..stall_end].iter_mut().for_each(|d| *d = 0);

        let frames = run(
            config(delay, max_desync, DEFAULT_RING_MULTIPLIER, false),
            &ours,
            &theirs,
            &schedule,
        );
        check_against_direct_stepping(&frames, max_desync)?;
    }

    #[test]
    fn identical_runs_are_deterministic(
        delay in 1u8..6,
        max_desync in 2u32..12,
        ours in prop::collection::vec(any::<i16>(), 20..60),
        theirs in prop::collection::vec(any::<i16>(), 20..60),
        schedule in prop::collection::vec(0usize..4, 20..80),
    ) {
        let first = run(config(delay, max_desync, 32, false), &ours, &theirs, &schedule);
        let second = run(config(delay, max_desync, 32, false), &ours, &theirs, &schedule);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn flipped_peer_sees_the_same_states(
        delay in 1u8..6,
        max_desync in 2u32..12,
        xs in prop::collection::vec(any::<i16>(), 20..60),
        ys in prop::collection::vec(any::<i16>(), 20..60),
        schedule in prop::collection::vec(0usize..4, 20..80),
    ) {
        let a = run(config(delay, max_desync, 32, false), &xs, &ys, &schedule);
        let b = run(config(delay, max_desync, 32, true), &ys, &xs, &schedule);
        prop_assert_eq!(a.len(), b.len());
        for (fa, fb) in a.iter().zip(&b) {
            prop_assert_eq!(fa.outcome, fb.outcome);
            prop_assert_eq!(fa.state, fb.state);
        }
    }
}
