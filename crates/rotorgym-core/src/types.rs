use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValidationError};

// ---------------------------------------------------------------------------
// Fidelity
// ---------------------------------------------------------------------------

/// Vehicle model fidelity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fidelity {
    /// Vertical motion only.
    OneD,
    /// Planar x-z motion with pitch.
    TwoD,
    /// Full 6-DOF rigid body.
    ThreeD,
}

impl Fidelity {
    /// Length of the state vector.
    pub const fn state_dim(self) -> usize {
        match self {
            Self::OneD => 2,
            Self::TwoD => 6,
            Self::ThreeD => 12,
        }
    }

    /// Number of independent thrust commands.
    pub const fn action_dim(self) -> usize {
        match self {
            Self::OneD => 1,
            Self::TwoD => 2,
            Self::ThreeD => 4,
        }
    }

    /// Number of components of an external force in this fidelity.
    pub const fn force_dim(self) -> usize {
        match self {
            Self::OneD => 1,
            Self::TwoD => 2,
            Self::ThreeD => 3,
        }
    }

    /// Integer code used in configuration files (1, 2, 3).
    pub const fn code(self) -> u8 {
        match self {
            Self::OneD => 1,
            Self::TwoD => 2,
            Self::ThreeD => 3,
        }
    }

    /// State component names, in state-vector order.
    pub const fn state_labels(self) -> &'static [&'static str] {
        match self {
            Self::OneD => &["z", "z_dot"],
            Self::TwoD => &["x", "x_dot", "z", "z_dot", "theta", "theta_dot"],
            Self::ThreeD => &[
                "x", "x_dot", "y", "y_dot", "z", "z_dot", "phi", "theta", "psi", "p", "q", "r",
            ],
        }
    }

    /// Keys accepted by initial-state overrides and randomization, in state order.
    pub const fn init_state_labels(self) -> &'static [&'static str] {
        match self {
            Self::OneD => &["init_z", "init_z_dot"],
            Self::TwoD => &[
                "init_x",
                "init_x_dot",
                "init_z",
                "init_z_dot",
                "init_theta",
                "init_theta_dot",
            ],
            Self::ThreeD => &[
                "init_x",
                "init_x_dot",
                "init_y",
                "init_y_dot",
                "init_z",
                "init_z_dot",
                "init_phi",
                "init_theta",
                "init_psi",
                "init_p",
                "init_q",
                "init_r",
            ],
        }
    }

    /// Inertial parameters that exist at this fidelity.
    pub const fn inertial_labels(self) -> &'static [&'static str] {
        match self {
            Self::OneD => &["M"],
            Self::TwoD => &["M", "Iyy"],
            Self::ThreeD => &["M", "Ixx", "Iyy", "Izz"],
        }
    }

    /// Action labels, in action-vector order.
    pub const fn action_labels(self) -> &'static [&'static str] {
        match self {
            Self::OneD => &["T"],
            Self::TwoD => &["T1", "T2"],
            Self::ThreeD => &["T1", "T2", "T3", "T4"],
        }
    }
}

impl TryFrom<u8> for Fidelity {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::OneD),
            2 => Ok(Self::TwoD),
            3 => Ok(Self::ThreeD),
            other => Err(ConfigError::UnsupportedFidelity(other)),
        }
    }
}

impl std::fmt::Display for Fidelity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d", self.code())
    }
}

// ---------------------------------------------------------------------------
// TaskKind / CostKind
// ---------------------------------------------------------------------------

/// What the vehicle is asked to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Hold a fixed goal state.
    #[default]
    Stabilization,
    /// Follow a time-indexed goal sequence.
    TrajectoryTracking,
}

/// Which reward/cost policy scores a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostKind {
    /// Dense shaped reward on squared state and action error.
    #[default]
    RlReward,
    /// Negated quadratic control cost.
    Quadratic,
    /// Sparse event reward for gate racing.
    Competition,
}

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// Flat f64 vector returned to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    data: Vec<f64>,
}

impl Observation {
    pub const fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

impl std::ops::Index<usize> for Observation {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.data[i]
    }
}

impl From<Vec<f64>> for Observation {
    fn from(data: Vec<f64>) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Thrust command, either normalized to [-1, 1] or in newtons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    data: Vec<f64>,
}

impl Action {
    pub const fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Check dimension and finiteness.
    pub fn validate(&self, expected_dim: usize) -> Result<(), ValidationError> {
        if self.data.len() != expected_dim {
            return Err(ValidationError::ActionDimMismatch {
                expected: expected_dim,
                got: self.data.len(),
            });
        }
        if self.data.iter().any(|v| v.is_nan()) {
            return Err(ValidationError::ActionContainsNan);
        }
        if self.data.iter().any(|v| v.is_infinite()) {
            return Err(ValidationError::ActionContainsInf);
        }
        Ok(())
    }
}

impl From<Vec<f64>> for Action {
    fn from(data: Vec<f64>) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// BoxSpace
// ---------------------------------------------------------------------------

/// Axis-aligned box with per-dimension bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    pub low: Vec<f64>,
    pub high: Vec<f64>,
}

impl BoxSpace {
    /// Panics if `low` and `high` differ in length.
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Self {
        assert_eq!(low.len(), high.len(), "BoxSpace bounds differ in length");
        Self { low, high }
    }

    /// Same scalar bounds on every dimension.
    pub fn uniform(dim: usize, low: f64, high: f64) -> Self {
        Self {
            low: vec![low; dim],
            high: vec![high; dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    pub fn contains(&self, values: &[f64]) -> bool {
        values.len() == self.dim()
            && values
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(v, (lo, hi))| *v >= *lo && *v <= *hi)
    }

    /// Clamp each component into its bounds.
    pub fn clip(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(self.low.iter().zip(&self.high))
            .map(|(v, (lo, hi))| v.clamp(*lo, *hi))
            .collect()
    }

    /// Sample uniformly inside the box.
    pub fn sample(&self, rng: &mut impl rand::Rng) -> Vec<f64> {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(lo, hi)| if lo < hi { rng.gen_range(*lo..*hi) } else { *lo })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Physics handles
// ---------------------------------------------------------------------------

/// Opaque handle to a body owned by a physics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Position plus roll/pitch/yaw, as used for gates and obstacles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f64; 3],
    pub rpy: [f64; 3],
}

impl Pose {
    pub const fn new(position: [f64; 3], rpy: [f64; 3]) -> Self {
        Self { position, rpy }
    }

    /// Flat `[x, y, z, roll, pitch, yaw]`.
    pub const fn to_array(&self) -> [f64; 6] {
        [
            self.position[0],
            self.position[1],
            self.position[2],
            self.rpy[0],
            self.rpy[1],
            self.rpy[2],
        ]
    }

    pub const fn yaw(&self) -> f64 {
        self.rpy[2]
    }
}

/// Kinematic state of a body as reported by the engine.
///
/// Angular velocity is expressed in the world frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub linear_velocity: Vector3<f64>,
    pub angular_velocity: Vector3<f64>,
}

impl BodyState {
    pub fn at_rest(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
        }
    }

    /// Roll, pitch, yaw of the orientation (x-y-z extrinsic).
    pub fn rpy(&self) -> Vector3<f64> {
        let (roll, pitch, yaw) = self.orientation.euler_angles();
        Vector3::new(roll, pitch, yaw)
    }

    /// Angular velocity rotated into the body frame.
    pub fn body_rates(&self) -> Vector3<f64> {
        self.orientation.inverse_transform_vector(&self.angular_velocity)
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.linear_velocity.iter().all(|v| v.is_finite())
            && self.angular_velocity.iter().all(|v| v.is_finite())
            && self.orientation.coords.iter().all(|v| v.is_finite())
    }
}

/// Static scene geometry the environment asks the engine to create.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StaticBody {
    /// Square gate frame centred at `pose` with outer edge `edge`, on a
    /// support post reaching down to the ground. The frame lies in the
    /// vertical plane along the pose's yaw direction.
    Gate { pose: Pose, edge: f64 },
    /// Vertical cylinder standing on the ground, top at `pose.position[2]`.
    Obstacle { pose: Pose, radius: f64 },
}

/// A single contact between two bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Penetration depth, positive when overlapping.
    pub depth: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
