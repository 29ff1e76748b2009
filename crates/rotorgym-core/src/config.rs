use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{CostKind, Fidelity, TaskKind};

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_fidelity() -> Fidelity {
    Fidelity::TwoD
}
const fn default_ctrl_freq() -> u32 {
    60
}
const fn default_pyb_freq() -> u32 {
    240
}
const fn default_episode_len_sec() -> f64 {
    5.0
}
const fn default_true() -> bool {
    true
}
const fn default_norm_act_scale() -> f64 {
    0.1
}
const fn default_gate_check_delay_sec() -> f64 {
    0.5
}
fn default_state_weight() -> Vec<f64> {
    vec![1.0]
}
fn default_act_weight() -> Vec<f64> {
    vec![0.0001]
}
fn default_unit_weight() -> Vec<f64> {
    vec![1.0]
}
const fn default_goal_tolerance() -> f64 {
    0.05
}
const fn default_num_cycles() -> u32 {
    1
}
fn default_trajectory_plane() -> String {
    "zx".into()
}
const fn default_trajectory_offset() -> [f64; 2] {
    [0.5, 0.0]
}
const fn default_trajectory_scale() -> f64 {
    -0.5
}
const fn default_proj_point() -> [f64; 3] {
    [0.0, 0.0, 0.5]
}
const fn default_proj_normal() -> [f64; 3] {
    [0.0, 1.0, 1.0]
}
const fn default_gate_reward() -> f64 {
    100.0
}
const fn default_goal_reward() -> f64 {
    100.0
}
const fn default_collision_penalty() -> f64 {
    1000.0
}
const fn default_constraint_penalty() -> f64 {
    100.0
}

// ---------------------------------------------------------------------------
// VehicleConfig
// ---------------------------------------------------------------------------

/// Physical parameters of the vehicle (Crazyflie 2.x defaults).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Mass in kg.
    pub mass: f64,
    /// Principal moments of inertia in kg m^2.
    pub ixx: f64,
    pub iyy: f64,
    pub izz: f64,
    /// Distance from the center of mass to each rotor, in m.
    pub arm_length: f64,
    /// Thrust coefficient (N per rpm^2).
    pub kf: f64,
    /// Torque coefficient (N m per rpm^2).
    pub km: f64,
    /// Gravitational acceleration in m/s^2.
    pub gravity: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            mass: 0.027,
            ixx: 1.4e-5,
            iyy: 1.4e-5,
            izz: 2.17e-5,
            arm_length: 0.0397,
            kf: 3.16e-10,
            km: 7.94e-12,
            gravity: 9.8,
        }
    }
}

impl VehicleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("vehicle.mass", self.mass),
            ("vehicle.ixx", self.ixx),
            ("vehicle.iyy", self.iyy),
            ("vehicle.izz", self.izz),
            ("vehicle.arm_length", self.arm_length),
            ("vehicle.kf", self.kf),
            ("vehicle.km", self.km),
            ("vehicle.gravity", self.gravity),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    message: format!("{value} (must be finite and > 0)"),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Inertial override, either positional (`[M]`, `[M, Iyy]`, `[M, Ixx, Iyy, Izz]`)
/// or keyed by `M`, `Ixx`, `Iyy`, `Izz`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InertialOverride {
    List(Vec<f64>),
    Table(BTreeMap<String, f64>),
}

/// Initial-state override, either the full state in label order or a
/// partial table keyed by init label. Missing entries default to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitStateOverride {
    Full(Vec<f64>),
    Partial(BTreeMap<String, f64>),
}

// ---------------------------------------------------------------------------
// Reward / cost weights
// ---------------------------------------------------------------------------

/// Weights of the dense shaped reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardWeightsConfig {
    /// Per-state-dimension weight, or a single broadcast value.
    #[serde(default = "default_state_weight")]
    pub state_weight: Vec<f64>,
    /// Per-action-dimension weight, or a single broadcast value.
    #[serde(default = "default_act_weight")]
    pub act_weight: Vec<f64>,
    /// Map the reward through `exp` so it lies in (0, 1].
    #[serde(default = "default_true")]
    pub exponential: bool,
}

impl Default for RewardWeightsConfig {
    fn default() -> Self {
        Self {
            state_weight: default_state_weight(),
            act_weight: default_act_weight(),
            exponential: true,
        }
    }
}

/// Diagonal weights of the quadratic cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticCostConfig {
    #[serde(default = "default_unit_weight")]
    pub q: Vec<f64>,
    #[serde(default = "default_unit_weight")]
    pub r: Vec<f64>,
}

impl Default for QuadraticCostConfig {
    fn default() -> Self {
        Self {
            q: default_unit_weight(),
            r: default_unit_weight(),
        }
    }
}

/// Point values of the sparse event reward. Penalties are magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SparseRewardConfig {
    #[serde(default = "default_gate_reward")]
    pub gate_reward: f64,
    #[serde(default = "default_goal_reward")]
    pub goal_reward: f64,
    #[serde(default = "default_collision_penalty")]
    pub collision_penalty: f64,
    #[serde(default = "default_constraint_penalty")]
    pub constraint_penalty: f64,
}

impl Default for SparseRewardConfig {
    fn default() -> Self {
        Self {
            gate_reward: default_gate_reward(),
            goal_reward: default_goal_reward(),
            collision_penalty: default_collision_penalty(),
            constraint_penalty: default_constraint_penalty(),
        }
    }
}

/// Expand a weight vector of length 1 or `dim` into `dim` entries.
pub fn broadcast_weights(
    field: &str,
    weights: &[f64],
    dim: usize,
) -> Result<Vec<f64>, ConfigError> {
    match weights.len() {
        1 => Ok(vec![weights[0]; dim]),
        n if n == dim => Ok(weights.to_vec()),
        n => Err(ConfigError::DimensionMismatch {
            field: field.into(),
            expected: dim,
            got: n,
        }),
    }
}

// ---------------------------------------------------------------------------
// TaskInfoConfig
// ---------------------------------------------------------------------------

/// Shape of a generated reference trajectory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryKind {
    #[default]
    Circle,
    #[serde(rename = "figure8")]
    Figure8,
    Square,
}

/// Task parameters for stabilization and tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfoConfig {
    /// Target position components. Defaults to `[z] = [1]` for 1D,
    /// `[x, z] = [0, 1]` for 2D and `[x, y, z] = [0, 0, 1]` for 3D.
    #[serde(default)]
    pub stabilization_goal: Option<Vec<f64>>,
    #[serde(default = "default_goal_tolerance")]
    pub stabilization_goal_tolerance: f64,
    #[serde(default)]
    pub trajectory_type: TrajectoryKind,
    #[serde(default = "default_num_cycles")]
    pub num_cycles: u32,
    /// Two distinct axes out of `x`, `y`, `z`, e.g. `"zx"`.
    #[serde(default = "default_trajectory_plane")]
    pub trajectory_plane: String,
    #[serde(default = "default_trajectory_offset")]
    pub trajectory_position_offset: [f64; 2],
    #[serde(default = "default_trajectory_scale")]
    pub trajectory_scale: f64,
    #[serde(default = "default_proj_point")]
    pub proj_point: [f64; 3],
    #[serde(default = "default_proj_normal")]
    pub proj_normal: [f64; 3],
}

impl Default for TaskInfoConfig {
    fn default() -> Self {
        Self {
            stabilization_goal: None,
            stabilization_goal_tolerance: default_goal_tolerance(),
            trajectory_type: TrajectoryKind::default(),
            num_cycles: default_num_cycles(),
            trajectory_plane: default_trajectory_plane(),
            trajectory_position_offset: default_trajectory_offset(),
            trajectory_scale: default_trajectory_scale(),
            proj_point: default_proj_point(),
            proj_normal: default_proj_normal(),
        }
    }
}

impl TaskInfoConfig {
    /// Axis indices `(a, b)` of the trajectory plane.
    pub fn plane_axes(&self) -> Result<(usize, usize), ConfigError> {
        let axis = |c: char| match c {
            'x' => Some(0),
            'y' => Some(1),
            'z' => Some(2),
            _ => None,
        };
        let mut chars = self.trajectory_plane.chars();
        let parsed = match (chars.next(), chars.next(), chars.next()) {
            (Some(a), Some(b), None) => axis(a).zip(axis(b)),
            _ => None,
        };
        match parsed {
            Some((a, b)) if a != b => Ok((a, b)),
            _ => Err(ConfigError::InvalidValue {
                field: "task_info.trajectory_plane".into(),
                message: format!(
                    "{:?} (expected two distinct axes out of x, y, z)",
                    self.trajectory_plane
                ),
            }),
        }
    }

    /// Stabilization target position as `[x, y, z]`.
    pub fn goal_position(&self, fidelity: Fidelity) -> Result<[f64; 3], ConfigError> {
        let Some(goal) = &self.stabilization_goal else {
            return Ok([0.0, 0.0, 1.0]);
        };
        let field = "task_info.stabilization_goal";
        match (fidelity, goal.as_slice()) {
            (Fidelity::OneD, [z] | [_, z]) => Ok([0.0, 0.0, *z]),
            (Fidelity::TwoD, [x, z]) => Ok([*x, 0.0, *z]),
            (Fidelity::ThreeD, [x, y, z]) => Ok([*x, *y, *z]),
            (_, other) => Err(ConfigError::DimensionMismatch {
                field: field.into(),
                expected: match fidelity {
                    Fidelity::OneD => 1,
                    Fidelity::TwoD => 2,
                    Fidelity::ThreeD => 3,
                },
                got: other.len(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Randomization
// ---------------------------------------------------------------------------

/// A named distribution family and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distrib", rename_all = "snake_case")]
pub enum DistributionSpec {
    Uniform { low: f64, high: f64 },
    Normal { loc: f64, scale: f64 },
    Fixed { value: f64 },
    LogUniform { low: f64, high: f64 },
}

/// Enable flag plus optional per-parameter distributions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RandomizationSection {
    #[serde(default)]
    pub enabled: bool,
    /// Replaces the built-in table when present.
    #[serde(default)]
    pub info: Option<BTreeMap<String, DistributionSpec>>,
}

/// Offsets for gate and obstacle placement. Each distribution drives the
/// x offset, y offset and yaw disturbance of its category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseRandomizationInfo {
    pub gates: DistributionSpec,
    pub obstacles: DistributionSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseRandomizationSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub info: Option<PoseRandomizationInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RandomizationConfig {
    #[serde(default)]
    pub init_state: RandomizationSection,
    #[serde(default)]
    pub inertial_prop: RandomizationSection,
    #[serde(default)]
    pub gates_and_obstacles: PoseRandomizationSection,
}

// ---------------------------------------------------------------------------
// Track
// ---------------------------------------------------------------------------

/// A gate as configured: `[x, y, z, roll, pitch, yaw]` plus a type code
/// (0 tall, 1 low).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    pub pose: [f64; 6],
    #[serde(rename = "type", default)]
    pub kind: i64,
}

/// A cylindrical obstacle as configured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleConfig {
    pub pose: [f64; 6],
}

// ---------------------------------------------------------------------------
// Disturbances
// ---------------------------------------------------------------------------

/// One additive disturbance source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisturbanceSpec {
    /// Zero-mean Gaussian noise, per-dimension or broadcast std.
    WhiteNoise { std: Vec<f64> },
    /// Constant push for `duration` steps starting at `step_offset`.
    Impulse {
        magnitude: f64,
        step_offset: u64,
        duration: u64,
    },
    /// Constant push from `step_offset` onwards.
    Step { magnitude: f64, step_offset: u64 },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisturbanceConfig {
    #[serde(default)]
    pub observation: Vec<DisturbanceSpec>,
    #[serde(default)]
    pub action: Vec<DisturbanceSpec>,
    #[serde(default)]
    pub dynamics: Vec<DisturbanceSpec>,
}

impl DisturbanceConfig {
    pub fn is_empty(&self) -> bool {
        self.observation.is_empty() && self.action.is_empty() && self.dynamics.is_empty()
    }
}

// ---------------------------------------------------------------------------
// EnvConfig
// ---------------------------------------------------------------------------

/// Complete environment configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    #[serde(default = "default_fidelity")]
    pub fidelity: Fidelity,
    #[serde(default)]
    pub task: TaskKind,
    #[serde(default)]
    pub cost: CostKind,

    /// Control rate in Hz.
    #[serde(default = "default_ctrl_freq")]
    pub ctrl_freq: u32,
    /// Physics rate in Hz. Must be a multiple of `ctrl_freq`.
    #[serde(default = "default_pyb_freq")]
    pub pyb_freq: u32,
    #[serde(default = "default_episode_len_sec")]
    pub episode_len_sec: f64,
    /// Seed of the episode random source.
    #[serde(default)]
    pub seed: u64,

    #[serde(default)]
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub inertial_prop: Option<InertialOverride>,
    #[serde(default)]
    pub init_state: Option<InitStateOverride>,

    #[serde(default)]
    pub normalized_action_space: bool,
    #[serde(default = "default_norm_act_scale")]
    pub norm_act_scale: f64,
    /// Number of future goals appended to the observation (dense reward only).
    #[serde(default)]
    pub obs_goal_horizon: usize,

    #[serde(default)]
    pub reward: RewardWeightsConfig,
    #[serde(default)]
    pub quadratic: QuadraticCostConfig,
    #[serde(default)]
    pub sparse: SparseRewardConfig,
    #[serde(default)]
    pub info_mse_metric_state_weight: Option<Vec<f64>>,

    #[serde(default = "default_true")]
    pub done_on_out_of_bound: bool,
    #[serde(default)]
    pub done_on_collision: bool,
    #[serde(default)]
    pub done_on_completion: bool,
    /// Simulated time before gate passage is checked.
    #[serde(default = "default_gate_check_delay_sec")]
    pub gate_check_delay_sec: f64,

    #[serde(default)]
    pub task_info: TaskInfoConfig,
    #[serde(default)]
    pub randomization: RandomizationConfig,
    #[serde(default)]
    pub gates: Vec<GateConfig>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,
    #[serde(default)]
    pub disturbances: DisturbanceConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            fidelity: default_fidelity(),
            task: TaskKind::default(),
            cost: CostKind::default(),
            ctrl_freq: default_ctrl_freq(),
            pyb_freq: default_pyb_freq(),
            episode_len_sec: default_episode_len_sec(),
            seed: 0,
            vehicle: VehicleConfig::default(),
            inertial_prop: None,
            init_state: None,
            normalized_action_space: false,
            norm_act_scale: default_norm_act_scale(),
            obs_goal_horizon: 0,
            reward: RewardWeightsConfig::default(),
            quadratic: QuadraticCostConfig::default(),
            sparse: SparseRewardConfig::default(),
            info_mse_metric_state_weight: None,
            done_on_out_of_bound: true,
            done_on_collision: false,
            done_on_completion: false,
            gate_check_delay_sec: default_gate_check_delay_sec(),
            task_info: TaskInfoConfig::default(),
            randomization: RandomizationConfig::default(),
            gates: Vec::new(),
            obstacles: Vec::new(),
            disturbances: DisturbanceConfig::default(),
        }
    }
}

impl EnvConfig {
    /// Builder: set the fidelity level.
    #[must_use]
    pub const fn with_fidelity(mut self, fidelity: Fidelity) -> Self {
        self.fidelity = fidelity;
        self
    }

    /// Builder: set task and cost.
    #[must_use]
    pub const fn with_task(mut self, task: TaskKind, cost: CostKind) -> Self {
        self.task = task;
        self.cost = cost;
        self
    }

    /// Builder: set the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate configuration. Returns Err on the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ctrl_freq == 0 || self.pyb_freq == 0 || self.pyb_freq % self.ctrl_freq != 0 {
            return Err(ConfigError::InvalidFrequencies {
                ctrl_freq: self.ctrl_freq,
                pyb_freq: self.pyb_freq,
            });
        }
        if !self.episode_len_sec.is_finite() || self.episode_len_sec <= 0.0 {
            return Err(invalid("episode_len_sec", self.episode_len_sec, "must be > 0"));
        }
        if !self.norm_act_scale.is_finite() || self.norm_act_scale < 0.0 {
            return Err(invalid("norm_act_scale", self.norm_act_scale, "must be >= 0"));
        }
        if !self.gate_check_delay_sec.is_finite() || self.gate_check_delay_sec < 0.0 {
            return Err(invalid(
                "gate_check_delay_sec",
                self.gate_check_delay_sec,
                "must be >= 0",
            ));
        }
        if self.task_info.stabilization_goal_tolerance <= 0.0 {
            return Err(invalid(
                "task_info.stabilization_goal_tolerance",
                self.task_info.stabilization_goal_tolerance,
                "must be > 0",
            ));
        }
        if self.task_info.num_cycles == 0 {
            return Err(ConfigError::InvalidValue {
                field: "task_info.num_cycles".into(),
                message: "must be >= 1".into(),
            });
        }
        if self.task_info.proj_normal.iter().all(|v| *v == 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "task_info.proj_normal".into(),
                message: "must be non-zero".into(),
            });
        }
        if self.task == TaskKind::TrajectoryTracking && self.cost == CostKind::Competition {
            return Err(ConfigError::Incompatible(
                "competition reward requires a fixed goal position (stabilization task)".into(),
            ));
        }
        self.task_info.plane_axes()?;
        self.task_info.goal_position(self.fidelity)?;

        self.vehicle.validate()?;
        self.effective_vehicle()?;
        self.initial_state()?;

        let nx = self.fidelity.state_dim();
        let nu = self.fidelity.action_dim();
        broadcast_weights("reward.state_weight", &self.reward.state_weight, nx)?;
        broadcast_weights("reward.act_weight", &self.reward.act_weight, nu)?;
        broadcast_weights("quadratic.q", &self.quadratic.q, nx)?;
        broadcast_weights("quadratic.r", &self.quadratic.r, nu)?;
        self.mse_weights()?;

        if self.randomization.gates_and_obstacles.enabled
            && self.randomization.gates_and_obstacles.info.is_none()
        {
            return Err(ConfigError::MissingField(
                "randomization.gates_and_obstacles.info".into(),
            ));
        }
        Ok(())
    }

    /// Control timestep in seconds.
    pub fn ctrl_timestep(&self) -> f64 {
        1.0 / f64::from(self.ctrl_freq)
    }

    /// Physics timestep in seconds.
    pub fn pyb_timestep(&self) -> f64 {
        1.0 / f64::from(self.pyb_freq)
    }

    /// Physics substeps per control step.
    pub const fn substeps(&self) -> u32 {
        self.pyb_freq / self.ctrl_freq
    }

    /// Episode length in control steps.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn ctrl_steps(&self) -> usize {
        (self.episode_len_sec * f64::from(self.ctrl_freq)).round() as usize
    }

    /// Nominal vehicle after applying `inertial_prop`.
    pub fn effective_vehicle(&self) -> Result<VehicleConfig, ConfigError> {
        let mut vehicle = self.vehicle;
        match &self.inertial_prop {
            None => {}
            Some(InertialOverride::List(values)) => match (self.fidelity, values.as_slice()) {
                (Fidelity::OneD, [m]) => vehicle.mass = *m,
                (Fidelity::TwoD, [m, iyy]) => {
                    vehicle.mass = *m;
                    vehicle.iyy = *iyy;
                }
                (Fidelity::ThreeD, [m, ixx, iyy, izz]) => {
                    vehicle.mass = *m;
                    vehicle.ixx = *ixx;
                    vehicle.iyy = *iyy;
                    vehicle.izz = *izz;
                }
                (fidelity, other) => {
                    return Err(ConfigError::InvalidInertialOverride(format!(
                        "{fidelity} vehicle expects {} values, got {}",
                        fidelity.inertial_labels().len(),
                        other.len()
                    )));
                }
            },
            Some(InertialOverride::Table(table)) => {
                for (key, value) in table {
                    match key.as_str() {
                        "M" => vehicle.mass = *value,
                        "Ixx" => vehicle.ixx = *value,
                        "Iyy" => vehicle.iyy = *value,
                        "Izz" => vehicle.izz = *value,
                        other => {
                            return Err(ConfigError::InvalidInertialOverride(format!(
                                "unknown key {other:?}"
                            )));
                        }
                    }
                }
            }
        }
        if [vehicle.mass, vehicle.ixx, vehicle.iyy, vehicle.izz]
            .iter()
            .any(|v| !v.is_finite() || *v <= 0.0)
        {
            return Err(ConfigError::InvalidInertialOverride(
                "mass and inertia must be finite and > 0".into(),
            ));
        }
        Ok(vehicle)
    }

    /// Nominal initial state keyed by init label, in state order.
    pub fn initial_state(&self) -> Result<Vec<(&'static str, f64)>, ConfigError> {
        let labels = self.fidelity.init_state_labels();
        match &self.init_state {
            None => Ok(labels.iter().map(|l| (*l, 0.0)).collect()),
            Some(InitStateOverride::Full(values)) => {
                if values.len() != labels.len() {
                    return Err(ConfigError::InvalidInitialState(format!(
                        "{} vehicle expects {} values, got {}",
                        self.fidelity,
                        labels.len(),
                        values.len()
                    )));
                }
                Ok(labels.iter().copied().zip(values.iter().copied()).collect())
            }
            Some(InitStateOverride::Partial(table)) => {
                if let Some(unknown) = table.keys().find(|k| !labels.contains(&k.as_str())) {
                    return Err(ConfigError::InvalidInitialState(format!(
                        "unknown label {unknown:?} for {} vehicle",
                        self.fidelity
                    )));
                }
                Ok(labels
                    .iter()
                    .map(|l| (*l, table.get(*l).copied().unwrap_or(0.0)))
                    .collect())
            }
        }
    }

    /// Weights of the info MSE metric (positions only by default).
    pub fn mse_weights(&self) -> Result<Vec<f64>, ConfigError> {
        let nx = self.fidelity.state_dim();
        match &self.info_mse_metric_state_weight {
            Some(weights) if weights.len() == nx => Ok(weights.clone()),
            Some(weights) => Err(ConfigError::DimensionMismatch {
                field: "info_mse_metric_state_weight".into(),
                expected: nx,
                got: weights.len(),
            }),
            None => Ok(match self.fidelity {
                Fidelity::OneD => vec![1.0, 0.0],
                Fidelity::TwoD => vec![1.0, 0.0, 1.0, 0.0, 0.0, 0.0],
                Fidelity::ThreeD => vec![
                    1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
                ],
            }),
        }
    }

    /// Load from a TOML string and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

fn invalid(field: &str, value: f64, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: format!("{value} ({message})"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
