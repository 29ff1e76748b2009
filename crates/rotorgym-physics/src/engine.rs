//! A small deterministic rigid-body engine for one quadrotor.
//!
//! The vehicle is integrated with semi-implicit Euler using the same rotor
//! model as the 3D dynamics: thrust `kf * rpm^2` along body z, X-frame
//! roll/pitch torques and yaw torque `km * rpm^2`. Scenery is static and
//! made of capsules. The ground is the half-space `z <= 0`; the vehicle
//! origin is clamped to stay on or above it.

use std::f64::consts::SQRT_2;

use nalgebra::{UnitQuaternion, Vector3};
use rotorgym_core::config::VehicleConfig;
use rotorgym_core::traits::PhysicsEngine;
use rotorgym_core::{BodyId, BodyState, Contact, Pose, StaticBody};
use rotorgym_dynamics::VehicleParams;
use tracing::{debug, trace};

use crate::geometry::{Capsule, ground_ray_fraction};

/// Radius of the sphere that stands in for the vehicle in every query.
pub const VEHICLE_RADIUS: f64 = 0.06;

/// Radius of the four bars of a gate frame and its support post.
pub const GATE_BAR_RADIUS: f64 = 0.0125;

const VEHICLE: BodyId = BodyId(0);
const GROUND: BodyId = BodyId(1);
const FIRST_STATIC: u32 = 2;

// ---------------------------------------------------------------------------
// Scenery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Scenery {
    pose: Pose,
    shapes: Vec<Capsule>,
}

impl Scenery {
    fn from_body(body: &StaticBody) -> Self {
        match *body {
            StaticBody::Gate { pose, edge } => Self {
                pose,
                shapes: gate_shapes(&pose, edge),
            },
            StaticBody::Obstacle { pose, radius } => {
                let [x, y, top] = pose.position;
                Self {
                    pose,
                    shapes: vec![Capsule::new(
                        Vector3::new(x, y, 0.0),
                        Vector3::new(x, y, top),
                        radius,
                    )],
                }
            }
        }
    }
}

/// Square frame in the vertical plane along the gate's yaw, plus a post
/// from the bottom bar to the ground.
fn gate_shapes(pose: &Pose, edge: f64) -> Vec<Capsule> {
    let center = Vector3::from(pose.position);
    let yaw = pose.yaw();
    let along = Vector3::new(yaw.cos(), yaw.sin(), 0.0);
    let up = Vector3::z();
    let h = edge / 2.0 - GATE_BAR_RADIUS;
    let corners = [
        center + along * h + up * h,
        center - along * h + up * h,
        center - along * h - up * h,
        center + along * h - up * h,
    ];
    let mut shapes: Vec<Capsule> = (0..4)
        .map(|i| Capsule::new(corners[i], corners[(i + 1) % 4], GATE_BAR_RADIUS))
        .collect();
    let bottom = center - up * h;
    if bottom.z > 0.0 {
        shapes.push(Capsule::new(
            Vector3::new(bottom.x, bottom.y, 0.0),
            bottom,
            GATE_BAR_RADIUS,
        ));
    }
    shapes
}

enum Geometry {
    Ground,
    Shapes(Vec<Capsule>),
}

// ---------------------------------------------------------------------------
// RigidBodyEngine
// ---------------------------------------------------------------------------

/// Reference [`PhysicsEngine`] used by the CLI and the integration tests.
#[derive(Debug, Clone)]
pub struct RigidBodyEngine {
    params: VehicleParams,
    kf: f64,
    km: f64,
    state: BodyState,
    scenery: Vec<Scenery>,
    time: f64,
}

impl RigidBodyEngine {
    pub fn new(params: VehicleParams, kf: f64, km: f64) -> Self {
        Self {
            params,
            kf,
            km,
            state: BodyState::at_rest(Vector3::zeros(), UnitQuaternion::identity()),
            scenery: Vec::new(),
            time: 0.0,
        }
    }

    pub fn from_vehicle(vehicle: &VehicleConfig) -> Self {
        Self::new(VehicleParams::from(vehicle), vehicle.kf, vehicle.km)
    }

    /// Simulated seconds since the last reset.
    pub const fn time(&self) -> f64 {
        self.time
    }

    pub const fn params(&self) -> &VehicleParams {
        &self.params
    }

    /// Number of static bodies currently spawned.
    pub fn scenery_len(&self) -> usize {
        self.scenery.len()
    }

    fn scenery(&self, id: BodyId) -> Option<&Scenery> {
        let index = id.0.checked_sub(FIRST_STATIC)?;
        self.scenery.get(index as usize)
    }

    fn geometry(&self, id: BodyId) -> Option<Geometry> {
        match id {
            VEHICLE => Some(Geometry::Shapes(vec![Capsule::sphere(
                self.state.position,
                VEHICLE_RADIUS,
            )])),
            GROUND => Some(Geometry::Ground),
            _ => self.scenery(id).map(|s| Geometry::Shapes(s.shapes.clone())),
        }
    }

    /// Signed surface distance between two bodies.
    fn distance(&self, a: BodyId, b: BodyId) -> Option<f64> {
        let min = |values: Vec<f64>| values.into_iter().reduce(f64::min);
        match (self.geometry(a)?, self.geometry(b)?) {
            (Geometry::Ground, Geometry::Ground) => None,
            (Geometry::Ground, Geometry::Shapes(shapes))
            | (Geometry::Shapes(shapes), Geometry::Ground) => {
                min(shapes.iter().map(Capsule::height_above_ground).collect())
            }
            (Geometry::Shapes(xs), Geometry::Shapes(ys)) => min(
                xs.iter()
                    .flat_map(|x| ys.iter().map(move |y| x.distance_to(y)))
                    .collect(),
            ),
        }
    }

    /// Body torque of the X-frame rotor set for per-motor thrusts `f` and
    /// yaw moments `m`.
    fn body_torque(&self, f: &[f64; 4], m: &[f64; 4]) -> Vector3<f64> {
        let arm = self.params.arm_length / SQRT_2;
        Vector3::new(
            arm * (f[0] + f[1] - f[2] - f[3]),
            arm * (-f[0] + f[1] + f[2] - f[3]),
            m[0] - m[1] + m[2] - m[3],
        )
    }
}

impl PhysicsEngine for RigidBodyEngine {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "rigid_body"
    }

    fn reset(&mut self) {
        debug!(removed = self.scenery.len(), "engine reset");
        self.scenery.clear();
        self.time = 0.0;
    }

    fn vehicle(&self) -> BodyId {
        VEHICLE
    }

    fn ground_plane(&self) -> BodyId {
        GROUND
    }

    #[allow(clippy::cast_possible_truncation)]
    fn spawn(&mut self, body: &StaticBody) -> BodyId {
        let id = BodyId(FIRST_STATIC + self.scenery.len() as u32);
        trace!(?id, ?body, "spawn static body");
        self.scenery.push(Scenery::from_body(body));
        id
    }

    fn set_vehicle_inertia(&mut self, mass: f64, inertia: [f64; 3]) {
        self.params = self.params.with_inertial(mass, inertia);
    }

    fn set_vehicle_state(&mut self, state: &BodyState) {
        self.state = *state;
    }

    fn advance(&mut self, rpm: &[f64; 4], external_force: Option<&Vector3<f64>>, dt: f64) {
        let thrusts = rpm.map(|w| self.kf * w * w);
        let moments = rpm.map(|w| self.km * w * w);
        let mass = self.params.mass;
        let inertia = Vector3::from(self.params.inertia);
        let rot = self.state.orientation;

        let mut force = rot * Vector3::new(0.0, 0.0, thrusts.iter().sum())
            - Vector3::new(0.0, 0.0, mass * self.params.gravity);
        if let Some(external) = external_force {
            force += external;
        }

        let rates = rot.inverse_transform_vector(&self.state.angular_velocity);
        let torque = self.body_torque(&thrusts, &moments);
        let gyro = rates.cross(&inertia.component_mul(&rates));
        let rate_dot = (torque - gyro).component_div(&inertia);
        let rates = rates + rate_dot * dt;

        let state = &mut self.state;
        state.linear_velocity += force / mass * dt;
        state.position += state.linear_velocity * dt;
        state.orientation = rot * UnitQuaternion::from_scaled_axis(rates * dt);
        state.angular_velocity = state.orientation * rates;

        if state.position.z < 0.0 {
            state.position.z = 0.0;
            state.linear_velocity.z = state.linear_velocity.z.max(0.0);
        }
        self.time += dt;
    }

    fn body_state(&self, body: BodyId) -> Option<BodyState> {
        match body {
            VEHICLE => Some(self.state),
            GROUND => Some(BodyState::at_rest(
                Vector3::zeros(),
                UnitQuaternion::identity(),
            )),
            _ => self.scenery(body).map(|s| {
                let [roll, pitch, yaw] = s.pose.rpy;
                BodyState::at_rest(
                    Vector3::from(s.pose.position),
                    UnitQuaternion::from_euler_angles(roll, pitch, yaw),
                )
            }),
        }
    }

    fn contacts(&self, a: BodyId, b: BodyId) -> Vec<Contact> {
        match self.distance(a, b) {
            Some(d) if d <= 0.0 => vec![Contact {
                body_a: a,
                body_b: b,
                depth: -d,
            }],
            _ => Vec::new(),
        }
    }

    fn ray_test_batch(&self, from: &[Vector3<f64>], to: &[Vector3<f64>]) -> Vec<f64> {
        let vehicle = Capsule::sphere(self.state.position, VEHICLE_RADIUS);
        from.iter()
            .zip(to)
            .map(|(f, t)| {
                std::iter::once(vehicle)
                    .chain(self.scenery.iter().flat_map(|s| s.shapes.iter().copied()))
                    .filter_map(|shape| shape.ray_fraction(f, t))
                    .chain(ground_ray_fraction(f, t))
                    .fold(1.0, f64::min)
            })
            .collect()
    }

    fn closest_points(&self, a: BodyId, b: BodyId, max_distance: f64) -> Option<f64> {
        self.distance(a, b)
            .filter(|d| *d <= max_distance)
            .map(|d| d.max(0.0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DVector;
    use rotorgym_core::Fidelity;
    use rotorgym_dynamics::DynamicsModel;

    const KF: f64 = 3.16e-10;

    fn engine() -> RigidBodyEngine {
        RigidBodyEngine::from_vehicle(&VehicleConfig::default())
    }

    fn rpm_for(thrust: f64) -> f64 {
        (thrust / KF).sqrt()
    }

    fn hover_at(z: f64) -> RigidBodyEngine {
        let mut e = engine();
        e.set_vehicle_state(&BodyState::at_rest(
            Vector3::new(0.0, 0.0, z),
            UnitQuaternion::identity(),
        ));
        e
    }

    // -- Trait shape --

    #[test]
    fn trait_is_object_safe() {
        fn _accepts_boxed(_: Box<dyn PhysicsEngine>) {}
        let e: Box<dyn PhysicsEngine> = Box::new(engine());
        assert_eq!(e.name(), "rigid_body");
        assert_ne!(e.vehicle(), e.ground_plane());
    }

    // -- Integration --

    #[test]
    fn hover_rpm_holds_altitude() {
        let mut e = hover_at(1.0);
        let rpm = [rpm_for(0.027 * 9.8 / 4.0); 4];
        for _ in 0..240 {
            e.advance(&rpm, None, 1.0 / 240.0);
        }
        let s = e.body_state(VEHICLE).unwrap();
        assert_relative_eq!(s.position.z, 1.0, epsilon = 1e-9);
        assert_relative_eq!(s.angular_velocity.norm(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(e.time(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn free_fall_accelerates_down() {
        let mut e = hover_at(5.0);
        for _ in 0..100 {
            e.advance(&[0.0; 4], None, 0.001);
        }
        let s = e.body_state(VEHICLE).unwrap();
        assert_relative_eq!(s.linear_velocity.z, -0.98, epsilon = 1e-9);
        assert!((s.position.z - (5.0 - 0.5 * 9.8 * 0.01)).abs() < 1e-3);
    }

    #[test]
    fn ground_clamps_vehicle() {
        let mut e = hover_at(0.0);
        for _ in 0..50 {
            e.advance(&[0.0; 4], None, 0.01);
        }
        let s = e.body_state(VEHICLE).unwrap();
        assert_relative_eq!(s.position.z, 0.0);
        assert!(s.linear_velocity.z >= 0.0);
        assert_eq!(e.contacts(VEHICLE, GROUND).len(), 1);
    }

    #[test]
    fn external_force_pushes_vehicle() {
        let mut e = hover_at(1.0);
        let rpm = [rpm_for(0.027 * 9.8 / 4.0); 4];
        let push = Vector3::new(0.027, 0.0, 0.0);
        for _ in 0..100 {
            e.advance(&rpm, Some(&push), 0.01);
        }
        let s = e.body_state(VEHICLE).unwrap();
        assert_relative_eq!(s.linear_velocity.x, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn set_vehicle_inertia_changes_hover_balance() {
        let mut e = hover_at(1.0);
        e.set_vehicle_inertia(0.054, [2.8e-5, 2.8e-5, 4.34e-5]);
        let rpm = [rpm_for(0.027 * 9.8 / 4.0); 4];
        e.advance(&rpm, None, 0.01);
        let s = e.body_state(VEHICLE).unwrap();
        assert!(s.linear_velocity.z < 0.0);
    }

    #[test]
    fn matches_three_d_model_over_short_horizon() {
        let thrusts = [0.070, 0.064, 0.068, 0.066];
        let x0 = DVector::from_vec(vec![
            0.1, 0.2, -0.3, 0.0, 1.0, 0.1, 0.05, -0.04, 0.3, 0.2, -0.1, 0.05,
        ]);
        let model = DynamicsModel::new(Fidelity::ThreeD, VehicleParams::default(), 0.01);
        let expected = model.discrete_step(&x0, &DVector::from_row_slice(&thrusts));

        let mut e = engine();
        let orientation = UnitQuaternion::from_euler_angles(x0[6], x0[7], x0[8]);
        e.set_vehicle_state(&BodyState {
            position: Vector3::new(x0[0], x0[2], x0[4]),
            orientation,
            linear_velocity: Vector3::new(x0[1], x0[3], x0[5]),
            angular_velocity: orientation * Vector3::new(x0[9], x0[10], x0[11]),
        });
        let rpm = thrusts.map(rpm_for);
        for _ in 0..1000 {
            e.advance(&rpm, None, 1.0e-5);
        }
        let got = model.state_from_body(&e.body_state(VEHICLE).unwrap());
        for i in 0..12 {
            assert!(
                (got[i] - expected[i]).abs() < 2e-3,
                "state {i}: engine {} vs model {}",
                got[i],
                expected[i]
            );
        }
    }

    // -- Scenery and queries --

    #[test]
    fn reset_clears_scenery() {
        let mut e = engine();
        let pose = Pose::new([1.0, 0.0, 1.0], [0.0; 3]);
        let id = e.spawn(&StaticBody::Gate { pose, edge: 0.45 });
        assert_eq!(id, BodyId(2));
        assert!(e.body_state(id).is_some());
        e.reset();
        assert_eq!(e.scenery_len(), 0);
        assert!(e.body_state(id).is_none());
        assert_eq!(e.time(), 0.0);
    }

    #[test]
    fn obstacle_contact_and_proximity() {
        let mut e = hover_at(0.5);
        let pose = Pose::new([0.1, 0.0, 1.05], [0.0; 3]);
        let id = e.spawn(&StaticBody::Obstacle { pose, radius: 0.05 });
        let contacts = e.contacts(VEHICLE, id);
        assert_eq!(contacts.len(), 1);
        assert_relative_eq!(contacts[0].depth, 0.01, epsilon = 1e-9);
        assert_eq!(e.closest_points(VEHICLE, id, 0.45), Some(0.0));

        e.set_vehicle_state(&BodyState::at_rest(
            Vector3::new(0.5, 0.0, 0.5),
            UnitQuaternion::identity(),
        ));
        assert!(e.contacts(VEHICLE, id).is_empty());
        let d = e.closest_points(VEHICLE, id, 0.45).unwrap();
        assert_relative_eq!(d, 0.29, epsilon = 1e-9);
        assert!(e.closest_points(VEHICLE, id, 0.2).is_none());
    }

    #[test]
    fn rays_through_gate_aperture_only_hit_vehicle() {
        let mut e = hover_at(3.0);
        let pose = Pose::new([0.0, 0.0, 1.0], [0.0, 0.0, 0.0]);
        e.spawn(&StaticBody::Gate { pose, edge: 0.45 });
        let from: Vec<_> = (-3..=3)
            .map(|i| Vector3::new(f64::from(i) * 0.05, 0.0, 1.0 - 0.1875))
            .collect();
        let to: Vec<_> = from.iter().map(|p| p + Vector3::new(0.0, 0.0, 0.375)).collect();
        assert!(e.ray_test_batch(&from, &to).iter().all(|f| *f == 1.0));

        e.set_vehicle_state(&BodyState::at_rest(
            Vector3::new(0.02, 0.0, 1.0),
            UnitQuaternion::identity(),
        ));
        let fractions = e.ray_test_batch(&from, &to);
        assert!(fractions.iter().any(|f| *f < 0.9999));
    }

    #[test]
    fn vehicle_hits_gate_bar() {
        let mut e = hover_at(1.0 + 0.2125);
        let pose = Pose::new([0.0, 0.0, 1.0], [0.0, 0.0, 0.0]);
        let gate = e.spawn(&StaticBody::Gate { pose, edge: 0.45 });
        assert_eq!(e.contacts(VEHICLE, gate).len(), 1);
        assert_eq!(e.contacts(GROUND, gate).len(), 1);
    }
}
