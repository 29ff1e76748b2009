//! The dynamics model handed to controllers and reward evaluation.
//!
//! Built once per environment and shared read-only. Every method is a pure
//! function of its numeric arguments.

use nalgebra::{DMatrix, DVector};
use rotorgym_core::config::broadcast_weights;
use rotorgym_core::{BodyState, ConfigError, Fidelity};

use crate::params::VehicleParams;
use crate::vehicle::VehicleDynamics;

/// Perturbation used by [`DynamicsModel::linearize`].
const FD_EPS: f64 = 1e-6;

/// Diagonal cost matrix from a broadcast-or-full weight vector.
pub fn cost_weight_matrix(
    field: &str,
    weights: &[f64],
    dim: usize,
) -> Result<DMatrix<f64>, ConfigError> {
    let diag = broadcast_weights(field, weights, dim)?;
    Ok(DMatrix::from_diagonal(&DVector::from_vec(diag)))
}

/// Closed-form dynamics, observation map and quadratic cost for one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicsModel {
    dynamics: VehicleDynamics,
    params: VehicleParams,
    dt: f64,
}

impl DynamicsModel {
    /// `dt` is the discretisation step used by [`discrete_step`](Self::discrete_step).
    pub fn new(fidelity: Fidelity, params: VehicleParams, dt: f64) -> Self {
        Self {
            dynamics: VehicleDynamics::new(fidelity, &params),
            params,
            dt,
        }
    }

    pub const fn fidelity(&self) -> Fidelity {
        self.dynamics.fidelity()
    }

    pub const fn state_dim(&self) -> usize {
        self.fidelity().state_dim()
    }

    pub const fn input_dim(&self) -> usize {
        self.fidelity().action_dim()
    }

    pub const fn dt(&self) -> f64 {
        self.dt
    }

    pub const fn params(&self) -> &VehicleParams {
        &self.params
    }

    pub const fn state_labels(&self) -> &'static [&'static str] {
        self.fidelity().state_labels()
    }

    pub const fn input_labels(&self) -> &'static [&'static str] {
        self.fidelity().action_labels()
    }

    /// Per-actuator hover thrust, the equilibrium input.
    pub fn hover_input(&self) -> DVector<f64> {
        let n = self.input_dim();
        DVector::from_element(n, self.params.hover_thrust_per_actuator(n))
    }

    /// `x_dot = f(x, u)`.
    pub fn state_derivative(&self, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
        self.dynamics.derivative(x, u)
    }

    /// The full state is observed at every fidelity.
    pub fn observation(&self, x: &DVector<f64>) -> DVector<f64> {
        x.clone()
    }

    /// Reduce an engine body state to the model's state vector.
    pub fn state_from_body(&self, body: &BodyState) -> DVector<f64> {
        self.dynamics.state_from_body(body)
    }

    /// `0.5 (x - xr)' Q (x - xr) + 0.5 (u - ur)' R (u - ur)`.
    pub fn loss(
        &self,
        x: &DVector<f64>,
        u: &DVector<f64>,
        x_ref: &DVector<f64>,
        u_ref: &DVector<f64>,
        q: &DMatrix<f64>,
        r: &DMatrix<f64>,
    ) -> f64 {
        let dx = x - x_ref;
        let du = u - u_ref;
        0.5 * dx.dot(&(q * &dx)) + 0.5 * du.dot(&(r * &du))
    }

    /// One step of classical RK4 over `dt` with `u` held constant.
    pub fn discrete_step(&self, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
        let h = self.dt;
        let k1 = self.state_derivative(x, u);
        let k2 = self.state_derivative(&(x + &k1 * (h / 2.0)), u);
        let k3 = self.state_derivative(&(x + &k2 * (h / 2.0)), u);
        let k4 = self.state_derivative(&(x + &k3 * h), u);
        x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
    }

    /// Continuous-time Jacobians `(df/dx, df/du)` by central differences.
    pub fn linearize(&self, x: &DVector<f64>, u: &DVector<f64>) -> (DMatrix<f64>, DMatrix<f64>) {
        let nx = self.state_dim();
        let nu = self.input_dim();
        let mut a = DMatrix::zeros(nx, nx);
        let mut b = DMatrix::zeros(nx, nu);

        for j in 0..nx {
            let mut plus = x.clone();
            let mut minus = x.clone();
            plus[j] += FD_EPS;
            minus[j] -= FD_EPS;
            let col = (self.state_derivative(&plus, u) - self.state_derivative(&minus, u))
                / (2.0 * FD_EPS);
            a.set_column(j, &col);
        }
        for j in 0..nu {
            let mut plus = u.clone();
            let mut minus = u.clone();
            plus[j] += FD_EPS;
            minus[j] -= FD_EPS;
            let col = (self.state_derivative(x, &plus) - self.state_derivative(x, &minus))
                / (2.0 * FD_EPS);
            b.set_column(j, &col);
        }
        (a, b)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ALL: [Fidelity; 3] = [Fidelity::OneD, Fidelity::TwoD, Fidelity::ThreeD];

    fn model(fidelity: Fidelity) -> DynamicsModel {
        DynamicsModel::new(fidelity, VehicleParams::default(), 1.0 / 60.0)
    }

    // -- Loss --

    #[test]
    fn loss_is_zero_at_reference() {
        for fidelity in ALL {
            let m = model(fidelity);
            let x = DVector::from_fn(m.state_dim(), |i, _| 0.3 * i as f64 - 1.0);
            let u = DVector::from_element(m.input_dim(), 0.07);
            let q = DMatrix::from_fn(m.state_dim(), m.state_dim(), |i, j| {
                if i == j { 2.0 + i as f64 } else { 0.1 }
            });
            let r = DMatrix::identity(m.input_dim(), m.input_dim()) * 5.0;
            assert_relative_eq!(m.loss(&x, &u, &x, &u, &q, &r), 0.0);
        }
    }

    #[test]
    fn loss_matches_hand_computation() {
        let m = model(Fidelity::OneD);
        let x = DVector::from_vec(vec![1.0, 0.5]);
        let xr = DVector::from_vec(vec![0.0, 0.0]);
        let u = DVector::from_vec(vec![0.3]);
        let ur = DVector::from_vec(vec![0.1]);
        let q = cost_weight_matrix("q", &[2.0, 4.0], 2).unwrap();
        let r = cost_weight_matrix("r", &[10.0], 1).unwrap();
        // 0.5 * (2*1 + 4*0.25) + 0.5 * 10 * 0.04
        assert_relative_eq!(m.loss(&x, &u, &xr, &ur, &q, &r), 1.7, epsilon = 1e-12);
    }

    #[test]
    fn cost_weight_matrix_rejects_bad_length() {
        assert!(matches!(
            cost_weight_matrix("quadratic.q", &[1.0, 2.0], 6),
            Err(ConfigError::DimensionMismatch { expected: 6, got: 2, .. })
        ));
        let q = cost_weight_matrix("quadratic.q", &[3.0], 4).unwrap();
        assert_eq!(q, DMatrix::identity(4, 4) * 3.0);
    }

    // -- Observation / labels --

    #[test]
    fn observation_is_identity() {
        let m = model(Fidelity::TwoD);
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(m.observation(&x), x);
        assert_eq!(m.state_labels().len(), 6);
        assert_eq!(m.input_labels(), &["T1", "T2"]);
    }

    // -- Discretisation --

    #[test]
    fn discrete_step_holds_hover() {
        for fidelity in ALL {
            let m = model(fidelity);
            let x = DVector::zeros(m.state_dim());
            let next = m.discrete_step(&x, &m.hover_input());
            assert_relative_eq!(next.norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn discrete_step_free_fall_is_exact() {
        let m = model(Fidelity::OneD);
        let x = DVector::from_vec(vec![2.0, 0.0]);
        let next = m.discrete_step(&x, &DVector::zeros(1));
        let dt = m.dt();
        assert_relative_eq!(next[0], 2.0 - 0.5 * 9.8 * dt * dt, epsilon = 1e-12);
        assert_relative_eq!(next[1], -9.8 * dt, epsilon = 1e-12);
    }

    // -- Linearization --

    #[test]
    fn linearize_vertical_model() {
        let m = model(Fidelity::OneD);
        let (a, b) = m.linearize(&DVector::zeros(2), &m.hover_input());
        assert_relative_eq!(a[(0, 1)], 1.0, epsilon = 1e-6);
        assert_relative_eq!(a[(1, 0)], 0.0, epsilon = 1e-6);
        assert_relative_eq!(b[(1, 0)], 1.0 / 0.027, epsilon = 1e-4);
    }

    #[test]
    fn linearize_full_model_at_hover() {
        let m = model(Fidelity::ThreeD);
        let (a, b) = m.linearize(&DVector::zeros(12), &m.hover_input());
        assert_eq!(a.shape(), (12, 12));
        assert_eq!(b.shape(), (12, 4));
        // Pitch tilts thrust into +x: d(x_ddot)/d(theta) = g.
        assert_relative_eq!(a[(1, 7)], 9.8, epsilon = 1e-4);
        // Roll tilts thrust into -y: d(y_ddot)/d(phi) = -g.
        assert_relative_eq!(a[(3, 6)], -9.8, epsilon = 1e-4);
        // Every rotor adds vertical acceleration 1/m.
        for j in 0..4 {
            assert_relative_eq!(b[(5, j)], 1.0 / 0.027, epsilon = 1e-3);
        }
    }
}
