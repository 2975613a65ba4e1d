//! A tiny two-player game driven through the sync engine
//!
//! State layout (little-endian): `x` of player one, `x` of player two, then a
//! running checksum of every input applied.

use crate::rng::XorShift;

pub const STATE_SIZE: usize = 16;
pub const INPUT_SIZE: usize = 2;

const ARENA: i32 = 1_000;

/// Initial state: players at opposite ends of the arena
pub fn initial_state() -> [u8; STATE_SIZE] {
    encode(-ARENA / 2, ARENA / 2, 0)
}

/// Step function shared by both peers; `one` is always player one's input
pub fn step(state: &mut [u8], one: &[u8], two: &[u8]) {
    let (a, b, sum) = decode(state);
    let a = (a + move_by(one)).clamp(-ARENA, ARENA);
    let b = (b + move_by(two)).clamp(-ARENA, ARENA);
    let sum = sum
        .rotate_left(5)
        .wrapping_mul(0x100_0000_01b3)
        ^ u64::from(u16::from_le_bytes([one[0], one[1]]))
        ^ u64::from(u16::from_le_bytes([two[0], two[1]])) << 16;
    state.copy_from_slice(&encode(a, b, sum));
}

fn move_by(input: &[u8]) -> i32 {
    let speed = if input[1] != 0 { 3 } else { 1 };
    i32::from(input[0] as i8).signum() * speed
}

fn encode(a: i32, b: i32, sum: u64) -> [u8; STATE_SIZE] {
    let mut out = [0u8; STATE_SIZE];
    out[0..4].copy_from_slice(&a.to_le_bytes());
    out[4..8].copy_from_slice(&b.to_le_bytes());
    out[8..16].copy_from_slice(&sum.to_le_bytes());
    out
}

fn decode(state: &[u8]) -> (i32, i32, u64) {
    let mut a = [0u8; 4];
    let mut b = [0u8; 4];
    let mut sum = [0u8; 8];
    a.copy_from_slice(&state[0..4]);
    b.copy_from_slice(&state[4..8]);
    sum.copy_from_slice(&state[8..16]);
    (i32::from_le_bytes(a), i32::from_le_bytes(b), u64::from_le_bytes(sum))
}

/// Human-readable summary of a state
pub fn describe(state: &[u8]) -> String {
    let (a, b, sum) = decode(state);
    format!("one at {:>5}, two at {:>5}, checksum {:016x}", a, b, sum)
}

/// Scripted controller standing in for a human at the keyboard
pub struct Controller {
    rng: XorShift,
}

impl Controller {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: XorShift::new(seed),
        }
    }

    pub fn poll(&mut self) -> [u8; INPUT_SIZE] {
        let direction = self.rng.range(-1, 1) as i8;
        let boost = u8::from(self.rng.range(0, 3) == 0);
        [direction as u8, boost]
    }
}
