//! Scriptable [`PhysicsEngine`] for testing the environment without a
//! simulator.
//!
//! The vehicle does not move unless a test moves it. Contacts, ray hits
//! and proximity are whatever the test scripted, and every mutating call
//! is recorded in [`ScriptedEngine::calls`].

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::{UnitQuaternion, Vector3};
use rotorgym_core::traits::PhysicsEngine;
use rotorgym_core::{BodyId, BodyState, Contact, StaticBody};

const VEHICLE: BodyId = BodyId(0);
const GROUND: BodyId = BodyId(1);
const FIRST_STATIC: u32 = 2;

/// One mutating call received by a [`ScriptedEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Reset,
    Spawn(StaticBody),
    SetInertia { mass: f64, inertia: [f64; 3] },
    SetState(BodyState),
    Advance {
        rpm: [f64; 4],
        external_force: Option<Vector3<f64>>,
        dt: f64,
    },
}

// ---------------------------------------------------------------------------
// ScriptedEngine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScriptedEngine {
    /// Current vehicle state; tests may overwrite it between steps.
    pub state: BodyState,
    /// Fraction returned for every ray.
    pub ray_fraction: f64,
    /// Vehicle-to-body distances reported by `closest_points`.
    pub proximity: BTreeMap<BodyId, f64>,
    contacts: BTreeSet<(BodyId, BodyId)>,
    spawned: Vec<StaticBody>,
    calls: Vec<EngineCall>,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            state: BodyState::at_rest(Vector3::zeros(), UnitQuaternion::identity()),
            ray_fraction: 1.0,
            proximity: BTreeMap::new(),
            contacts: BTreeSet::new(),
            spawned: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Handle the `index`-th spawned static body receives.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn static_id(index: usize) -> BodyId {
        BodyId(FIRST_STATIC + index as u32)
    }

    /// Move the vehicle to `position` at rest, level.
    pub fn place_vehicle(&mut self, position: [f64; 3]) {
        self.state = BodyState::at_rest(Vector3::from(position), UnitQuaternion::identity());
    }

    /// Report a contact between `a` and `b` (in either order) from now on.
    pub fn touch(&mut self, a: BodyId, b: BodyId) {
        self.contacts.insert(ordered(a, b));
    }

    pub fn clear_contacts(&mut self) {
        self.contacts.clear();
    }

    pub fn spawned(&self) -> &[StaticBody] {
        &self.spawned
    }

    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    /// Number of `advance` calls recorded so far.
    pub fn advance_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, EngineCall::Advance { .. }))
            .count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

fn ordered(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl PhysicsEngine for ScriptedEngine {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "scripted"
    }

    fn reset(&mut self) {
        self.spawned.clear();
        self.calls.push(EngineCall::Reset);
    }

    fn vehicle(&self) -> BodyId {
        VEHICLE
    }

    fn ground_plane(&self) -> BodyId {
        GROUND
    }

    fn spawn(&mut self, body: &StaticBody) -> BodyId {
        let id = Self::static_id(self.spawned.len());
        self.spawned.push(*body);
        self.calls.push(EngineCall::Spawn(*body));
        id
    }

    fn set_vehicle_inertia(&mut self, mass: f64, inertia: [f64; 3]) {
        self.calls.push(EngineCall::SetInertia { mass, inertia });
    }

    fn set_vehicle_state(&mut self, state: &BodyState) {
        self.state = *state;
        self.calls.push(EngineCall::SetState(*state));
    }

    fn advance(&mut self, rpm: &[f64; 4], external_force: Option<&Vector3<f64>>, dt: f64) {
        self.calls.push(EngineCall::Advance {
            rpm: *rpm,
            external_force: external_force.copied(),
            dt,
        });
    }

    fn body_state(&self, body: BodyId) -> Option<BodyState> {
        match body {
            VEHICLE => Some(self.state),
            GROUND => Some(BodyState::at_rest(
                Vector3::zeros(),
                UnitQuaternion::identity(),
            )),
            BodyId(n) => {
                let index = n.checked_sub(FIRST_STATIC)? as usize;
                let pose = match self.spawned.get(index)? {
                    StaticBody::Gate { pose, .. } | StaticBody::Obstacle { pose, .. } => pose,
                };
                let [roll, pitch, yaw] = pose.rpy;
                Some(BodyState::at_rest(
                    Vector3::from(pose.position),
                    UnitQuaternion::from_euler_angles(roll, pitch, yaw),
                ))
            }
        }
    }

    fn contacts(&self, a: BodyId, b: BodyId) -> Vec<Contact> {
        if self.contacts.contains(&ordered(a, b)) {
            vec![Contact {
                body_a: a,
                body_b: b,
                depth: 0.0,
            }]
        } else {
            Vec::new()
        }
    }

    fn ray_test_batch(&self, from: &[Vector3<f64>], to: &[Vector3<f64>]) -> Vec<f64> {
        vec![self.ray_fraction; from.len().min(to.len())]
    }

    fn closest_points(&self, a: BodyId, b: BodyId, max_distance: f64) -> Option<f64> {
        let other = if a == VEHICLE { b } else { a };
        self.proximity
            .get(&other)
            .copied()
            .filter(|d| *d <= max_distance)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
