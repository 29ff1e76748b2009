//! Thrust to PWM to RPM conversion for Crazyflie-class motors.

use rotorgym_core::config::VehicleConfig;
use rotorgym_core::traits::ThrustToRpm;

/// Linear PWM-to-RPM map `rpm = scale * pwm + offset`, with PWM limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PwmMotorMap {
    /// Thrust coefficient (N per rpm^2).
    pub kf: f64,
    pub pwm2rpm_scale: f64,
    pub pwm2rpm_offset: f64,
    pub min_pwm: f64,
    pub max_pwm: f64,
}

impl PwmMotorMap {
    pub const fn new(kf: f64) -> Self {
        Self {
            kf,
            pwm2rpm_scale: 0.2685,
            pwm2rpm_offset: 4070.3,
            min_pwm: 20000.0,
            max_pwm: 65535.0,
        }
    }

    pub const fn from_vehicle(vehicle: &VehicleConfig) -> Self {
        Self::new(vehicle.kf)
    }

    fn pwm_to_rpm(&self, pwm: f64) -> f64 {
        self.pwm2rpm_scale * pwm + self.pwm2rpm_offset
    }

    /// PWM that makes one motor produce `thrust / motors_per_command`.
    fn thrust_to_pwm(&self, thrust: f64, motors_per_command: f64) -> f64 {
        ((thrust.max(0.0) / motors_per_command / self.kf).sqrt() - self.pwm2rpm_offset)
            / self.pwm2rpm_scale
    }
}

/// Number of motors each command drives (4, 2 or 1).
#[allow(clippy::cast_precision_loss)]
fn motors_per_command(action_dim: usize) -> f64 {
    assert!(
        matches!(action_dim, 1 | 2 | 4),
        "thrust command must have 1, 2 or 4 entries, got {action_dim}"
    );
    (4 / action_dim) as f64
}

impl ThrustToRpm for PwmMotorMap {
    /// Panics if `thrust` does not have 1, 2 or 4 entries.
    fn thrust_to_rpm(&self, thrust: &[f64]) -> [f64; 4] {
        let n = motors_per_command(thrust.len());
        let pwm = |t: f64| self.thrust_to_pwm(t, n);
        let motors = match *thrust {
            [a] => [pwm(a); 4],
            [a, b] => {
                let (a, b) = (pwm(a), pwm(b));
                [a, b, b, a]
            }
            [a, b, c, d] => [pwm(a), pwm(b), pwm(c), pwm(d)],
            _ => unreachable!("checked by motors_per_command"),
        };
        motors.map(|p| self.pwm_to_rpm(p.clamp(self.min_pwm, self.max_pwm)))
    }

    fn thrust_limits(&self, action_dim: usize) -> (f64, f64) {
        let n = motors_per_command(action_dim);
        let thrust = |pwm: f64| self.kf * n * self.pwm_to_rpm(pwm).powi(2);
        (thrust(self.min_pwm), thrust(self.max_pwm))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
