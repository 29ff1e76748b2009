//! Termination conditions.
//!
//! Checked in a fixed order after every step: out of bounds, collision,
//! completion. The first condition that holds is reported as the cause.

use nalgebra::DVector;
use rotorgym_core::config::EnvConfig;
use rotorgym_core::{BoxSpace, Fidelity};
use serde::Serialize;

use crate::episode::Episode;
use crate::spaces::out_of_bounds;

/// State dimensions checked against the state bounds. Positions and
/// angles only.
pub const fn out_of_bounds_mask(fidelity: Fidelity) -> &'static [bool] {
    match fidelity {
        Fidelity::OneD => &[true, false],
        Fidelity::TwoD => &[true, false, true, false, true, false],
        Fidelity::ThreeD => &[
            true, false, true, false, true, false, true, true, true, false, false, false,
        ],
    }
}

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationCause {
    OutOfBounds,
    Collision,
    Completion,
}

// ---------------------------------------------------------------------------
// TerminationPolicy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TerminationPolicy {
    bounds: Option<(BoxSpace, &'static [bool])>,
    on_collision: bool,
    on_completion: bool,
}

impl TerminationPolicy {
    pub fn from_config(config: &EnvConfig, state_space: &BoxSpace) -> Self {
        Self {
            bounds: config
                .done_on_out_of_bound
                .then(|| (state_space.clone(), out_of_bounds_mask(config.fidelity))),
            on_collision: config.done_on_collision,
            on_completion: config.done_on_completion,
        }
    }

    pub fn check(&self, state: &DVector<f64>, episode: &Episode) -> Option<TerminationCause> {
        if let Some((space, mask)) = &self.bounds {
            if out_of_bounds(space, state, mask) {
                return Some(TerminationCause::OutOfBounds);
            }
        }
        if self.on_collision && episode.collision.is_some() {
            return Some(TerminationCause::Collision);
        }
        if self.on_completion && episode.task_completed {
            return Some(TerminationCause::Completion);
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
