//! Step functions and operand ordering
//!
//! The host supplies one deterministic transition for the whole session.
//! Both peers run the same function, so the order in which the two inputs
//! reach it has to agree on both machines. `apply_step` takes care of that
//! using the session's `flip` flag.

use std::fmt;

/// A pure, deterministic state transition: `(state, first, second) -> state'`.
///
/// The state is updated in place. Implementations must depend only on the
/// three arguments: identical bytes in must give identical bytes out, on
/// every peer, every time. Rollback replays ticks freely, so any hidden side
/// effect or outside input will desynchronize the peers.
///
/// Any `Fn(&mut [u8], &[u8], &[u8])` is a step function:
///
/// ```
/// use tandem_core::StepFunction;
///
/// let step = |state: &mut [u8], a: &[u8], b: &[u8]| {
///     state[0] = state[0].wrapping_add(a[0]).wrapping_sub(b[0]);
/// };
/// let mut state = [10u8];
/// step.step(&mut state, &[3], &[1]);
/// assert_eq!(state, [12]);
/// ```
pub trait StepFunction {
    /// Advance `state` by one tick using the two input records
    fn step(&self, state: &mut [u8], first: &[u8], second: &[u8]);
}

impl<F> StepFunction for F
where
    F: Fn(&mut [u8], &[u8], &[u8]),
{
    fn step(&self, state: &mut [u8], first: &[u8], second: &[u8]) {
        self(state, first, second)
    }
}

/// Which peer a record came from, from the local engine's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Produced on this machine
    Local,
    /// Delivered by the transport from the other peer
    Remote,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => write!(f, "local"),
            Side::Remote => write!(f, "remote"),
        }
    }
}

/// Run one step with the local and remote records in session order.
///
/// Unflipped sessions call `step(state, local, remote)`; flipped sessions
/// call `step(state, remote, local)`. Two peers configured with opposite
/// flips therefore feed the same operand order to a shared step function.
pub fn apply_step<S>(step: &S, flip: bool, state: &mut [u8], local: &[u8], remote: &[u8])
where
    S: StepFunction + ?Sized,
{
    if flip {
        step.step(state, remote, local);
    } else {
        step.step(state, local, remote);
    }
}
