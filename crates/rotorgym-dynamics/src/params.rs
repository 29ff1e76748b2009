//! Physical parameters consumed by the dynamics models.

use rotorgym_core::config::VehicleConfig;

/// Numeric vehicle parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleParams {
    pub mass: f64,
    pub gravity: f64,
    pub arm_length: f64,
    /// Principal moments `[Ixx, Iyy, Izz]`.
    pub inertia: [f64; 3],
    /// Rotor torque-to-thrust ratio `km / kf`.
    pub thrust_torque_ratio: f64,
}

impl VehicleParams {
    /// Total thrust that balances gravity.
    pub fn hover_thrust(&self) -> f64 {
        self.mass * self.gravity
    }

    /// Hover thrust split evenly over `actuators`.
    #[allow(clippy::cast_precision_loss)]
    pub fn hover_thrust_per_actuator(&self, actuators: usize) -> f64 {
        self.hover_thrust() / actuators as f64
    }

    /// Copy with mass and inertia replaced.
    #[must_use]
    pub const fn with_inertial(mut self, mass: f64, inertia: [f64; 3]) -> Self {
        self.mass = mass;
        self.inertia = inertia;
        self
    }
}

impl From<&VehicleConfig> for VehicleParams {
    fn from(config: &VehicleConfig) -> Self {
        Self {
            mass: config.mass,
            gravity: config.gravity,
            arm_length: config.arm_length,
            inertia: [config.ixx, config.iyy, config.izz],
            thrust_torque_ratio: config.km / config.kf,
        }
    }
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self::from(&VehicleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crazyflie_defaults() {
        let params = VehicleParams::default();
        assert!((params.mass - 0.027).abs() < f64::EPSILON);
        assert!((params.thrust_torque_ratio - 7.94e-12 / 3.16e-10).abs() < 1e-15);
        assert!((params.hover_thrust() - 0.027 * 9.8).abs() < 1e-12);
        assert!((params.hover_thrust_per_actuator(4) - 0.027 * 9.8 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn with_inertial_replaces_mass_and_inertia() {
        let params = VehicleParams::default().with_inertial(0.03, [1.0, 2.0, 3.0]);
        assert!((params.mass - 0.03).abs() < f64::EPSILON);
        assert_eq!(params.inertia, [1.0, 2.0, 3.0]);
    }
}
