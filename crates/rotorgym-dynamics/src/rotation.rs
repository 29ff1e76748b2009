//! Euler-angle helpers shared by the 3D model and the reference engine.
//!
//! Angles follow the roll-pitch-yaw convention `R = Rz(psi) Ry(theta) Rx(phi)`,
//! the same axis order the physics engine reports.

use nalgebra::{Matrix3, Rotation3};

/// Body-to-world rotation for roll `phi`, pitch `theta`, yaw `psi`.
pub fn body_to_world(phi: f64, theta: f64, psi: f64) -> Matrix3<f64> {
    Rotation3::from_euler_angles(phi, theta, psi).into_inner()
}

/// Matrix mapping body rates `[p, q, r]` to Euler-angle rates.
///
/// Singular at `theta = ±pi/2` (division by `cos(theta)`); the result is
/// not finite or very large there.
pub fn euler_rate_matrix(phi: f64, theta: f64) -> Matrix3<f64> {
    let (s_phi, c_phi) = phi.sin_cos();
    let (t_theta, c_theta) = (theta.tan(), theta.cos());
    Matrix3::new(
        1.0,
        s_phi * t_theta,
        c_phi * t_theta,
        0.0,
        c_phi,
        -s_phi,
        0.0,
        s_phi / c_theta,
        c_phi / c_theta,
    )
}
