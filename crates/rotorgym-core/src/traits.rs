//! Seams to the collaborators the environment drives but does not own.

use nalgebra::Vector3;

use crate::types::{BodyId, BodyState, Contact, StaticBody};

// ---------------------------------------------------------------------------
// PhysicsEngine
// ---------------------------------------------------------------------------

/// Rigid-body engine hosting one vehicle, a ground plane and static scenery.
///
/// All calls are blocking. The environment never holds references into the
/// engine across calls.
pub trait PhysicsEngine: Send {
    /// Human-readable engine name.
    fn name(&self) -> &str;

    /// Remove all static scenery and zero the simulation clock.
    fn reset(&mut self);

    /// Handle of the vehicle body.
    fn vehicle(&self) -> BodyId;

    /// Handle of the ground plane.
    fn ground_plane(&self) -> BodyId;

    /// Create a static body and return its handle.
    fn spawn(&mut self, body: &StaticBody) -> BodyId;

    /// Replace the vehicle's mass and principal inertia.
    fn set_vehicle_inertia(&mut self, mass: f64, inertia: [f64; 3]);

    /// Teleport the vehicle to `state`.
    fn set_vehicle_state(&mut self, state: &BodyState);

    /// Advance the simulation by `dt` seconds with the given rotor speeds
    /// and optional world-frame external force on the vehicle.
    fn advance(&mut self, rpm: &[f64; 4], external_force: Option<&Vector3<f64>>, dt: f64);

    /// Current state of `body`, if it exists.
    fn body_state(&self, body: BodyId) -> Option<BodyState>;

    /// Contacts currently reported between `a` and `b`.
    fn contacts(&self, a: BodyId, b: BodyId) -> Vec<Contact>;

    /// Hit fraction along each ray in `[0, 1]`; `1.0` means no hit.
    fn ray_test_batch(&self, from: &[Vector3<f64>], to: &[Vector3<f64>]) -> Vec<f64>;

    /// Distance between `a` and `b` if it is at most `max_distance`.
    fn closest_points(&self, a: BodyId, b: BodyId, max_distance: f64) -> Option<f64>;
}

// ---------------------------------------------------------------------------
// ThrustToRpm
// ---------------------------------------------------------------------------

/// Maps per-actuator thrust commands to the four rotor speeds.
pub trait ThrustToRpm: Send + Sync {
    /// `thrust` has 1, 2 or 4 entries depending on fidelity.
    fn thrust_to_rpm(&self, thrust: &[f64]) -> [f64; 4];

    /// Smallest and largest thrust per actuator when `action_dim`
    /// commands drive the four motors.
    fn thrust_limits(&self, action_dim: usize) -> (f64, f64);
}

// ---------------------------------------------------------------------------
// ConstraintMonitor
// ---------------------------------------------------------------------------

/// Supplies the constraint-violation flag consumed by the sparse reward.
pub trait ConstraintMonitor: Send + Sync {
    fn name(&self) -> &str;

    /// Whether `state`/`action` violate any monitored constraint.
    fn is_violated(&self, state: &[f64], action: &[f64]) -> bool;
}

/// Monitor that never reports a violation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstraints;

impl ConstraintMonitor for NoConstraints {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "none"
    }

    fn is_violated(&self, _state: &[f64], _action: &[f64]) -> bool {
        false
    }
}

/// Violated whenever any state component leaves `[low, high]`.
#[derive(Debug, Clone)]
pub struct StateBoxConstraint {
    pub low: Vec<f64>,
    pub high: Vec<f64>,
}

impl ConstraintMonitor for StateBoxConstraint {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "state_box"
    }

    fn is_violated(&self, state: &[f64], _action: &[f64]) -> bool {
        state
            .iter()
            .zip(self.low.iter().zip(&self.high))
            .any(|(v, (lo, hi))| v < lo || v > hi)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
