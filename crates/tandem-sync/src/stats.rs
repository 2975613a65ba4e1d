//! Debug counters for a sync session

use serde::{Deserialize, Serialize};

/// Running totals collected by a sync engine
///
/// Counters only ever go up, except `reset`, which the engine calls when the
/// session restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    /// Calls to `tick` that advanced `current_tick`
    pub ticks_advanced: u64,
    /// Advances spent inside the input-delay window
    pub warm_up_ticks: u64,
    /// Calls to `tick` that returned `Frozen`
    pub frozen_ticks: u64,
    /// Ticks whose output used only real inputs
    pub confirmed_ticks: u64,
    /// Ticks whose output used at least one predicted remote input
    pub predicted_ticks: u64,
    /// Times new remote input replaced predictions and the working state was
    /// rebuilt from the confirmed baseline
    pub rollbacks: u64,
    /// Step calls spent replaying ticks during rollbacks
    pub resimulated_steps: u64,
    /// Largest number of predicted ticks in a single output
    pub max_prediction_depth: u64,
    /// Local records accepted
    pub local_inputs: u64,
    /// Local records refused under backpressure
    pub dropped_local_inputs: u64,
    /// Remote records accepted
    pub remote_inputs: u64,
    /// Remote records ignored as re-deliveries
    pub duplicate_remote_inputs: u64,
}

impl SyncStats {
    /// Clear every counter
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Share of stepped ticks that needed prediction (0.0 to 1.0)
    pub fn prediction_ratio(&self) -> f32 {
        let stepped = self.confirmed_ticks + self.predicted_ticks;
        if stepped == 0 {
            0.0
        } else {
            self.predicted_ticks as f32 / stepped as f32
        }
    }

    pub(crate) fn record_prediction_depth(&mut self, depth: u64) {
        self.max_prediction_depth = self.max_prediction_depth.max(depth);
    }
}
