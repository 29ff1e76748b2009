//! Per-fidelity vehicle dynamics.
//!
//! State layouts:
//!
//! ```text
//! 1D: [z, z_dot]
//! 2D: [x, x_dot, z, z_dot, theta, theta_dot]
//! 3D: [x, x_dot, y, y_dot, z, z_dot, phi, theta, psi, p, q, r]
//! ```
//!
//! Inputs are per-actuator thrusts in newtons: `[T]`, `[T1, T2]` or
//! `[T1, T2, T3, T4]`. In 3D the rotors are in X configuration and
//! `[p, q, r]` are body rates.

use std::f64::consts::SQRT_2;

use nalgebra::{DVector, Matrix3, Vector3};
use rotorgym_core::{BodyState, Fidelity};

use crate::params::VehicleParams;
use crate::rotation::{body_to_world, euler_rate_matrix};

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// Vertical motion under a single thrust.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertical {
    mass: f64,
    gravity: f64,
}

/// Planar x-z motion with pitch and two thrusts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Planar {
    mass: f64,
    gravity: f64,
    arm_length: f64,
    iyy: f64,
}

/// Full 6-DOF rigid body with four rotors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Full {
    mass: f64,
    gravity: f64,
    arm_length: f64,
    thrust_torque_ratio: f64,
    inertia: Matrix3<f64>,
    inertia_inv: Matrix3<f64>,
}

/// Dynamics of one fidelity level, chosen once at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehicleDynamics {
    Vertical(Vertical),
    Planar(Planar),
    Full(Full),
}

impl VehicleDynamics {
    pub fn new(fidelity: Fidelity, params: &VehicleParams) -> Self {
        match fidelity {
            Fidelity::OneD => Self::Vertical(Vertical {
                mass: params.mass,
                gravity: params.gravity,
            }),
            Fidelity::TwoD => Self::Planar(Planar {
                mass: params.mass,
                gravity: params.gravity,
                arm_length: params.arm_length,
                iyy: params.inertia[1],
            }),
            Fidelity::ThreeD => {
                let [ixx, iyy, izz] = params.inertia;
                let inertia = Matrix3::from_diagonal(&Vector3::new(ixx, iyy, izz));
                let inertia_inv =
                    Matrix3::from_diagonal(&Vector3::new(1.0 / ixx, 1.0 / iyy, 1.0 / izz));
                Self::Full(Full {
                    mass: params.mass,
                    gravity: params.gravity,
                    arm_length: params.arm_length,
                    thrust_torque_ratio: params.thrust_torque_ratio,
                    inertia,
                    inertia_inv,
                })
            }
        }
    }

    pub const fn fidelity(&self) -> Fidelity {
        match self {
            Self::Vertical(_) => Fidelity::OneD,
            Self::Planar(_) => Fidelity::TwoD,
            Self::Full(_) => Fidelity::ThreeD,
        }
    }

    /// Continuous-time state derivative.
    ///
    /// # Panics
    ///
    /// If `x` or `u` do not match the fidelity's state and input dimensions.
    /// Observations and actions are validated before they reach the model.
    pub fn derivative(&self, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
        let fidelity = self.fidelity();
        assert_eq!(x.len(), fidelity.state_dim(), "state dimension mismatch");
        assert_eq!(u.len(), fidelity.action_dim(), "input dimension mismatch");
        match self {
            Self::Vertical(v) => v.derivative(x, u),
            Self::Planar(p) => p.derivative(x, u),
            Self::Full(f) => f.derivative(x, u),
        }
    }

    /// Reduce an engine body state to this fidelity's state vector.
    pub fn state_from_body(&self, body: &BodyState) -> DVector<f64> {
        let pos = body.position;
        let vel = body.linear_velocity;
        match self {
            Self::Vertical(_) => DVector::from_vec(vec![pos.z, vel.z]),
            Self::Planar(_) => {
                let rpy = body.rpy();
                DVector::from_vec(vec![
                    pos.x,
                    vel.x,
                    pos.z,
                    vel.z,
                    rpy.y,
                    body.angular_velocity.y,
                ])
            }
            Self::Full(_) => {
                let rpy = body.rpy();
                let rates = body.body_rates();
                DVector::from_vec(vec![
                    pos.x, vel.x, pos.y, vel.y, pos.z, vel.z, rpy.x, rpy.y, rpy.z, rates.x,
                    rates.y, rates.z,
                ])
            }
        }
    }
}

impl Vertical {
    fn derivative(&self, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
        DVector::from_vec(vec![x[1], u[0] / self.mass - self.gravity])
    }
}

impl Planar {
    fn derivative(&self, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
        let theta = x[4];
        let total = u[0] + u[1];
        DVector::from_vec(vec![
            x[1],
            theta.sin() * total / self.mass,
            x[3],
            theta.cos() * total / self.mass - self.gravity,
            x[5],
            self.arm_length * (u[1] - u[0]) / self.iyy / SQRT_2,
        ])
    }
}

impl Full {
    /// Body-frame torque of the X-configuration rotor set.
    fn body_torque(&self, f: &DVector<f64>) -> Vector3<f64> {
        let arm = self.arm_length / SQRT_2;
        Vector3::new(
            arm * (f[0] + f[1] - f[2] - f[3]),
            arm * (-f[0] + f[1] + f[2] - f[3]),
            self.thrust_torque_ratio * (f[0] - f[1] + f[2] - f[3]),
        )
    }

    fn derivative(&self, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
        let (phi, theta, psi) = (x[6], x[7], x[8]);
        let rates = Vector3::new(x[9], x[10], x[11]);

        let rot = body_to_world(phi, theta, psi);
        let thrust = Vector3::new(0.0, 0.0, u.sum());
        let accel = rot * thrust / self.mass - Vector3::new(0.0, 0.0, self.gravity);

        let torque = self.body_torque(u);
        let rate_dot = self.inertia_inv * (torque - rates.cross(&(self.inertia * rates)));
        let angle_dot = euler_rate_matrix(phi, theta) * rates;

        DVector::from_vec(vec![
            x[1],
            accel.x,
            x[3],
            accel.y,
            x[5],
            accel.z,
            angle_dot.x,
            angle_dot.y,
            angle_dot.z,
            rate_dot.x,
            rate_dot.y,
            rate_dot.z,
        ])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    fn params() -> VehicleParams {
        VehicleParams::default()
    }

    fn hover_input(fidelity: Fidelity) -> DVector<f64> {
        let n = fidelity.action_dim();
        DVector::from_element(n, params().hover_thrust_per_actuator(n))
    }

    // -- Hover --

    #[test]
    fn hover_is_equilibrium_for_every_fidelity() {
        for fidelity in [Fidelity::OneD, Fidelity::TwoD, Fidelity::ThreeD] {
            let dynamics = VehicleDynamics::new(fidelity, &params());
            let x = DVector::zeros(fidelity.state_dim());
            let xdot = dynamics.derivative(&x, &hover_input(fidelity));
            for (i, v) in xdot.iter().enumerate() {
                assert!(v.abs() < 1e-12, "{fidelity} component {i} = {v}");
            }
        }
    }

    #[test]
    fn hover_at_altitude_keeps_velocity_derivatives_zero() {
        let dynamics = VehicleDynamics::new(Fidelity::ThreeD, &params());
        let mut x = DVector::zeros(12);
        x[0] = 1.0;
        x[4] = 2.0;
        x[8] = 0.7;
        let xdot = dynamics.derivative(&x, &hover_input(Fidelity::ThreeD));
        assert_relative_eq!(xdot.norm(), 0.0, epsilon = 1e-12);
    }

    // -- 1D --

    #[test]
    fn vertical_free_fall() {
        let dynamics = VehicleDynamics::new(Fidelity::OneD, &params());
        let x = DVector::from_vec(vec![1.0, -0.5]);
        let xdot = dynamics.derivative(&x, &DVector::zeros(1));
        assert_relative_eq!(xdot[0], -0.5);
        assert_relative_eq!(xdot[1], -9.8);
    }

    // -- 2D --

    #[test]
    fn planar_pitch_torque_formula() {
        let p = params();
        let dynamics = VehicleDynamics::new(Fidelity::TwoD, &p);
        let x = DVector::zeros(6);
        let u = DVector::from_vec(vec![0.05, 0.08]);
        let xdot = dynamics.derivative(&x, &u);
        let expected = p.arm_length * (0.08 - 0.05) / p.inertia[1] / SQRT_2;
        assert_relative_eq!(xdot[5], expected, epsilon = 1e-9);
        assert_relative_eq!(xdot[3], 0.13 / p.mass - p.gravity, epsilon = 1e-12);
    }

    #[test]
    fn planar_tilt_accelerates_along_x() {
        let p = params();
        let dynamics = VehicleDynamics::new(Fidelity::TwoD, &p);
        let mut x = DVector::zeros(6);
        x[4] = 0.2;
        let xdot = dynamics.derivative(&x, &hover_input(Fidelity::TwoD));
        assert_relative_eq!(xdot[1], 0.2_f64.sin() * p.gravity, epsilon = 1e-12);
    }

    // -- 3D --

    #[test]
    fn full_differential_thrust_produces_roll_and_pitch() {
        let p = params();
        let dynamics = VehicleDynamics::new(Fidelity::ThreeD, &p);
        let x = DVector::zeros(12);
        let h = p.hover_thrust_per_actuator(4);
        // Motors 1 and 2 harder: positive roll torque, zero pitch torque.
        let u = DVector::from_vec(vec![h + 0.01, h + 0.01, h - 0.01, h - 0.01]);
        let xdot = dynamics.derivative(&x, &u);
        assert!(xdot[9] > 0.0);
        assert_relative_eq!(xdot[10], 0.0, epsilon = 1e-9);
        assert_relative_eq!(xdot[11], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn full_yaw_torque_from_rotor_drag() {
        let p = params();
        let dynamics = VehicleDynamics::new(Fidelity::ThreeD, &p);
        let h = p.hover_thrust_per_actuator(4);
        let u = DVector::from_vec(vec![h + 0.01, h - 0.01, h + 0.01, h - 0.01]);
        let xdot = dynamics.derivative(&DVector::zeros(12), &u);
        let expected = p.thrust_torque_ratio * 0.04 / p.inertia[2];
        assert_relative_eq!(xdot[11], expected, epsilon = 1e-9);
    }

    #[test]
    fn full_gyroscopic_coupling() {
        let p = params().with_inertial(0.027, [1.0e-5, 2.0e-5, 3.0e-5]);
        let dynamics = VehicleDynamics::new(Fidelity::ThreeD, &p);
        let mut x = DVector::zeros(12);
        x[9] = 1.0;
        x[11] = 1.0;
        let xdot = dynamics.derivative(&x, &hover_input(Fidelity::ThreeD));
        // q_dot = -(r*Ixx*p - p*Izz*r) / Iyy = (Izz - Ixx) p r / Iyy
        assert_relative_eq!(xdot[10], (3.0e-5 - 1.0e-5) / 2.0e-5, epsilon = 1e-9);
    }

    #[test]
    fn full_euler_rates_degenerate_at_vertical_pitch() {
        let dynamics = VehicleDynamics::new(Fidelity::ThreeD, &params());
        let mut x = DVector::zeros(12);
        x[6] = 0.1;
        x[7] = std::f64::consts::FRAC_PI_2;
        x[11] = 1.0;
        let xdot = dynamics.derivative(&x, &hover_input(Fidelity::ThreeD));
        assert!(xdot[8].abs() > 1e10 || !xdot[8].is_finite());
    }

    #[test]
    #[should_panic(expected = "input dimension mismatch")]
    fn wrong_input_dimension_panics() {
        let dynamics = VehicleDynamics::new(Fidelity::TwoD, &params());
        dynamics.derivative(&DVector::zeros(6), &DVector::zeros(4));
    }

    // -- Body state reduction --

    #[test]
    fn state_from_body_layouts() {
        let orientation = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let mut body = BodyState::at_rest(Vector3::new(1.0, 2.0, 3.0), orientation);
        body.linear_velocity = Vector3::new(0.4, 0.5, 0.6);
        body.angular_velocity = Vector3::new(0.0, 0.7, 0.0);

        let one = VehicleDynamics::new(Fidelity::OneD, &params()).state_from_body(&body);
        assert_eq!(one.as_slice(), &[3.0, 0.6]);

        let two = VehicleDynamics::new(Fidelity::TwoD, &params()).state_from_body(&body);
        assert_relative_eq!(two[0], 1.0);
        assert_relative_eq!(two[3], 0.6);
        assert_relative_eq!(two[4], 0.2, epsilon = 1e-12);
        assert_relative_eq!(two[5], 0.7);

        let three = VehicleDynamics::new(Fidelity::ThreeD, &params()).state_from_body(&body);
        assert_eq!(three.len(), 12);
        assert_relative_eq!(three[2], 2.0);
        assert_relative_eq!(three[6], 0.1, epsilon = 1e-12);
        assert_relative_eq!(three[8], 0.3, epsilon = 1e-12);
        let rates = Vector3::new(three[9], three[10], three[11]);
        assert_relative_eq!(orientation * rates, body.angular_velocity, epsilon = 1e-12);
    }
}
