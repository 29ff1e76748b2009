//! State and observation bounds.

use nalgebra::DVector;
use rotorgym_core::config::EnvConfig;
use rotorgym_core::{BoxSpace, CostKind, Fidelity, TaskKind};
use rotorgym_task::TaskGoal;

/// Horizontal position limit in metres.
pub const XY_LIMIT: f64 = 5.0;
pub const Z_LOW: f64 = -0.05;
pub const Z_HIGH: f64 = 2.5;
/// Roll and pitch limit, 85 degrees.
pub const TILT_LIMIT: f64 = 85.0 * std::f64::consts::PI / 180.0;
pub const YAW_LIMIT: f64 = std::f64::consts::PI;

#[allow(clippy::cast_lossless)]
const RATE_LIMIT: f64 = f32::MAX as f64;

/// Bounds of the state vector at `fidelity`. Rates are effectively
/// unbounded.
pub fn state_space(fidelity: Fidelity) -> BoxSpace {
    let pos = |limit: f64| (-limit, limit);
    let rate = (-RATE_LIMIT, RATE_LIMIT);
    let z = (Z_LOW, Z_HIGH);
    let bounds: Vec<(f64, f64)> = match fidelity {
        Fidelity::OneD => vec![z, rate],
        Fidelity::TwoD => vec![pos(XY_LIMIT), rate, z, rate, pos(TILT_LIMIT), rate],
        Fidelity::ThreeD => vec![
            pos(XY_LIMIT),
            rate,
            pos(XY_LIMIT),
            rate,
            z,
            rate,
            pos(TILT_LIMIT),
            pos(TILT_LIMIT),
            pos(YAW_LIMIT),
            rate,
            rate,
            rate,
        ],
    };
    let (low, high) = bounds.into_iter().unzip();
    BoxSpace::new(low, high)
}

/// Number of goal states appended to each observation. Only the dense
/// reward extends observations: stabilization appends its one goal,
/// tracking the next `obs_goal_horizon` goals.
pub fn goal_copies(config: &EnvConfig) -> usize {
    if config.cost != CostKind::RlReward || config.obs_goal_horizon == 0 {
        return 0;
    }
    match config.task {
        TaskKind::Stabilization => 1,
        TaskKind::TrajectoryTracking => config.obs_goal_horizon,
    }
}

/// `state_space` repeated `1 + goal_copies` times.
pub fn observation_space(state_space: &BoxSpace, goal_copies: usize) -> BoxSpace {
    let repeat = |v: &[f64]| v.repeat(1 + goal_copies);
    BoxSpace::new(repeat(&state_space.low), repeat(&state_space.high))
}

/// Append up to `goal_copies` goals starting at `next_step` to `obs`.
pub fn extend_observation(
    mut obs: Vec<f64>,
    goal: &TaskGoal,
    next_step: usize,
    goal_copies: usize,
) -> Vec<f64> {
    if goal_copies > 0 {
        for g in goal.lookahead(next_step, goal_copies) {
            obs.extend(g.iter());
        }
    }
    obs
}

/// Whether `state` lies outside `space` on any dimension selected by `mask`.
pub fn out_of_bounds(space: &BoxSpace, state: &DVector<f64>, mask: &[bool]) -> bool {
    state
        .iter()
        .zip(space.low.iter().zip(&space.high))
        .zip(mask)
        .any(|((v, (lo, hi)), checked)| *checked && (v < lo || v > hi))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
