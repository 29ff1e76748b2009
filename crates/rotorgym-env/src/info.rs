//! Diagnostic info returned by `reset` and `step`.

use std::sync::Arc;

use rotorgym_core::config::DisturbanceConfig;
use rotorgym_core::{BodyId, Observation, Pose};
use rotorgym_domain_rand::{DomainRandomizer, InertialProperties};
use rotorgym_dynamics::DynamicsModel;
use serde::Serialize;

use crate::terminations::TerminationCause;
use crate::track::GateSpec;

/// Per-step diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepInfo {
    /// Weighted squared error against the current goal.
    pub mse: f64,
    /// Body touched this step, and whether any contact was reported.
    pub collision: (Option<BodyId>, bool),
    /// Actual pose while in range, nominal pose otherwise.
    pub gates_pose: Vec<[f64; 6]>,
    pub gates_in_range: Vec<bool>,
    pub obstacles_pose: Vec<[f64; 6]>,
    pub obstacles_in_range: Vec<bool>,
    pub gates_type: Vec<i64>,
    pub current_gate_id: i64,
    pub at_goal_position: bool,
    pub task_completed: bool,
    /// Only reported for stabilization with the quadratic cost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_reached: Option<bool>,
    pub constraint_violated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination: Option<TerminationCause>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateShape {
    pub shape: &'static str,
    pub height: f64,
    pub edge: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateDimensions {
    pub tall: GateShape,
    pub low: GateShape,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObstacleDimensions {
    pub shape: &'static str,
    pub height: f64,
    pub radius: f64,
}

/// Everything a controller needs to know about the episode that just
/// started, plus the per-step fields.
#[derive(Debug, Clone, Serialize)]
pub struct ResetInfo {
    /// Nominal-parameter model at the control timestep.
    #[serde(skip)]
    pub model: Arc<DynamicsModel>,
    pub nominal_physical_parameters: InertialProperties,
    /// Goal states, one row per control step for tracking.
    pub x_reference: Vec<Vec<f64>>,
    pub u_reference: Vec<f64>,
    pub ctrl_timestep: f64,
    pub ctrl_freq: u32,
    pub episode_len_sec: f64,
    pub quadrotor_kf: f64,
    pub quadrotor_km: f64,
    pub gate_dimensions: GateDimensions,
    pub obstacle_dimensions: ObstacleDimensions,
    /// Gates as configured, before heights and offsets.
    pub nominal_gates: Vec<GateSpec>,
    pub nominal_obstacles: Vec<Pose>,
    pub randomization: DomainRandomizer,
    pub disturbances: DisturbanceConfig,
    #[serde(flatten)]
    pub step: StepInfo,
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    /// Ended by a termination condition.
    pub terminated: bool,
    /// Ended by the time limit.
    pub truncated: bool,
    pub info: StepInfo,
}

impl StepResult {
    pub const fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

#[derive(Debug, Clone)]
pub struct ResetResult {
    pub observation: Observation,
    pub info: ResetInfo,
}
