//! Gates and obstacles: parsing, placement and the gate passage rays.

use nalgebra::Vector3;
use rand::Rng;
use rotorgym_core::config::{GateConfig, ObstacleConfig};
use rotorgym_core::traits::PhysicsEngine;
use rotorgym_core::{BodyId, Pose, SimError, StaticBody};
use rotorgym_domain_rand::randomizers::PoseRandomizer;
use serde::Serialize;

/// Outer edge of the square gate frame.
pub const GATE_EDGE: f64 = 0.45;
pub const OBSTACLE_RADIUS: f64 = 0.05;
/// Height of the top of every obstacle.
pub const OBSTACLE_HEIGHT: f64 = 1.05;
/// Distance within which a gate or obstacle reports its actual pose.
pub const VISIBILITY_RANGE: f64 = 0.45;
/// A passage ray hit below this fraction counts as a crossing.
pub const PASSAGE_THRESHOLD: f64 = 0.9999;

const PASSAGE_HALF_LENGTH: f64 = 0.1875;
const PASSAGE_RAY_SPACING: f64 = 0.05;

// ---------------------------------------------------------------------------
// GateKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    Tall,
    Low,
}

impl GateKind {
    /// Height of the gate centre above the ground.
    pub const fn height(self) -> f64 {
        match self {
            Self::Tall => 1.0,
            Self::Low => 0.525,
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            Self::Tall => 0,
            Self::Low => 1,
        }
    }
}

impl TryFrom<i64> for GateKind {
    type Error = SimError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Tall),
            1 => Ok(Self::Low),
            other => Err(SimError::UnknownGateType(other)),
        }
    }
}

fn pose_from(values: &[f64; 6]) -> Pose {
    let [x, y, z, roll, pitch, yaw] = *values;
    Pose::new([x, y, z], [roll, pitch, yaw])
}

// ---------------------------------------------------------------------------
// Track
// ---------------------------------------------------------------------------

/// A gate as configured, before placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateSpec {
    pub pose: Pose,
    pub kind: GateKind,
}

impl GateSpec {
    /// Configured pose with z replaced by the gate height.
    pub const fn nominal_pose(&self) -> Pose {
        let mut pose = self.pose;
        pose.position[2] = self.kind.height();
        pose
    }
}

/// The configured course. Gate type codes are checked here, once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Track {
    gates: Vec<GateSpec>,
    obstacles: Vec<Pose>,
}

impl Track {
    pub fn from_config(
        gates: &[GateConfig],
        obstacles: &[ObstacleConfig],
    ) -> Result<Self, SimError> {
        let gates = gates
            .iter()
            .map(|g| {
                Ok(GateSpec {
                    pose: pose_from(&g.pose),
                    kind: GateKind::try_from(g.kind)?,
                })
            })
            .collect::<Result<_, SimError>>()?;
        let obstacles = obstacles.iter().map(|o| pose_from(&o.pose)).collect();
        Ok(Self { gates, obstacles })
    }

    pub fn gates(&self) -> &[GateSpec] {
        &self.gates
    }

    pub fn obstacles(&self) -> &[Pose] {
        &self.obstacles
    }

    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    pub fn nominal_gate_poses(&self) -> Vec<Pose> {
        self.gates.iter().map(GateSpec::nominal_pose).collect()
    }

    /// Configured obstacle poses with z replaced by the obstacle height.
    pub fn nominal_obstacle_poses(&self) -> Vec<Pose> {
        self.obstacles
            .iter()
            .map(|p| {
                let mut pose = *p;
                pose.position[2] = OBSTACLE_HEIGHT;
                pose
            })
            .collect()
    }

    pub fn gate_types(&self) -> Vec<i64> {
        self.gates.iter().map(|g| g.kind.code()).collect()
    }

    /// Draw the placed poses for one episode. Obstacles draw first, then
    /// gates, each taking x, y and yaw offsets in that order.
    pub fn layout<R: Rng + ?Sized>(
        &self,
        randomizer: Option<&PoseRandomizer>,
        rng: &mut R,
    ) -> TrackLayout {
        let obstacles = self
            .obstacles
            .iter()
            .map(|nominal| {
                let offset = randomizer.map(|r| r.obstacle_offset(rng)).unwrap_or_default();
                let mut pose = shifted(nominal, offset.dx, offset.dy, 0.0, offset.dyaw);
                pose.position[2] = OBSTACLE_HEIGHT;
                pose
            })
            .collect();
        let gates = self
            .gates
            .iter()
            .map(|gate| {
                let offset = randomizer.map(|r| r.gate_offset(rng)).unwrap_or_default();
                let height = gate.kind.height();
                let pose = shifted(&gate.pose, offset.dx, offset.dy, height, offset.dyaw);
                (pose, gate.kind)
            })
            .collect();
        TrackLayout { gates, obstacles }
    }
}

fn shifted(pose: &Pose, dx: f64, dy: f64, dz: f64, dyaw: f64) -> Pose {
    let [x, y, z] = pose.position;
    let [roll, pitch, yaw] = pose.rpy;
    Pose::new([x + dx, y + dy, z + dz], [roll, pitch, yaw + dyaw])
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Placed poses for one episode, not yet in the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackLayout {
    pub gates: Vec<(Pose, GateKind)>,
    pub obstacles: Vec<Pose>,
}

impl TrackLayout {
    /// Create every body in `engine`: obstacles first, then gates.
    pub fn spawn<E: PhysicsEngine + ?Sized>(self, engine: &mut E) -> PlacedTrack {
        let obstacles = self
            .obstacles
            .into_iter()
            .map(|pose| {
                let id = engine.spawn(&StaticBody::Obstacle {
                    pose,
                    radius: OBSTACLE_RADIUS,
                });
                PlacedBody { id, pose }
            })
            .collect();
        let gates = self
            .gates
            .into_iter()
            .map(|(pose, kind)| {
                let id = engine.spawn(&StaticBody::Gate {
                    pose,
                    edge: GATE_EDGE,
                });
                PlacedGate {
                    body: PlacedBody { id, pose },
                    kind,
                }
            })
            .collect();
        PlacedTrack { gates, obstacles }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedBody {
    pub id: BodyId,
    pub pose: Pose,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGate {
    pub body: PlacedBody,
    pub kind: GateKind,
}

impl PlacedGate {
    /// Seven vertical rays spanning the aperture, spaced along the gate's
    /// yaw direction and centred on the gate height.
    pub fn passage_rays(&self) -> (Vec<Vector3<f64>>, Vec<Vector3<f64>>) {
        let [x, y, _] = self.body.pose.position;
        let yaw = self.body.pose.yaw();
        let height = self.kind.height();
        let (dx, dy) = (PASSAGE_RAY_SPACING * yaw.cos(), PASSAGE_RAY_SPACING * yaw.sin());
        let offsets = [0.0, 1.0, -1.0, 2.0, -2.0, 3.0, -3.0];
        let from = offsets
            .iter()
            .map(|i| Vector3::new(x + i * dx, y + i * dy, height - PASSAGE_HALF_LENGTH))
            .collect();
        let to = offsets
            .iter()
            .map(|i| Vector3::new(x + i * dx, y + i * dy, height + PASSAGE_HALF_LENGTH))
            .collect();
        (from, to)
    }
}

/// Bodies of the current episode, in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacedTrack {
    pub gates: Vec<PlacedGate>,
    pub obstacles: Vec<PlacedBody>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
