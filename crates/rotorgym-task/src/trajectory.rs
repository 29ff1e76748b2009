//! Planar parametric reference trajectories.
//!
//! A trajectory lives in a plane spanned by two world axes `(a, b)`. The
//! shape is traced `num_cycles` times over the trajectory length, scaled
//! by `scale` and shifted by `offset` in plane coordinates.

use std::f64::consts::TAU;

use nalgebra::Vector3;
use rotorgym_core::ConfigError;
use rotorgym_core::config::{TaskInfoConfig, TrajectoryKind};

/// Produces reference position and velocity at time `t`.
pub trait TrajectoryGenerator: Send + Sync {
    fn sample(&self, t: f64) -> (Vector3<f64>, Vector3<f64>);
}

// ---------------------------------------------------------------------------
// ParametricTrajectory
// ---------------------------------------------------------------------------

/// Circle, figure-eight or square traced in an axis-aligned plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParametricTrajectory {
    kind: TrajectoryKind,
    period: f64,
    axes: (usize, usize),
    offset: [f64; 2],
    scale: f64,
}

impl ParametricTrajectory {
    /// Panics if the axes are equal or out of range.
    pub fn new(
        kind: TrajectoryKind,
        length: f64,
        num_cycles: u32,
        axes: (usize, usize),
        offset: [f64; 2],
        scale: f64,
    ) -> Self {
        assert!(axes.0 < 3 && axes.1 < 3 && axes.0 != axes.1, "invalid plane axes");
        Self {
            kind,
            period: length / f64::from(num_cycles.max(1)),
            axes,
            offset,
            scale,
        }
    }

    /// Build from the task section of the configuration.
    pub fn from_task_info(info: &TaskInfoConfig, length: f64) -> Result<Self, ConfigError> {
        Ok(Self::new(
            info.trajectory_type,
            length,
            info.num_cycles,
            info.plane_axes()?,
            info.trajectory_position_offset,
            info.trajectory_scale,
        ))
    }

    pub const fn period(&self) -> f64 {
        self.period
    }

    /// Plane coordinates `(a, b, a_dot, b_dot)` before the offset.
    fn plane_coords(&self, t: f64) -> (f64, f64, f64, f64) {
        let s = self.scale;
        let w = TAU / self.period;
        let (sin, cos) = (w * t).sin_cos();
        match self.kind {
            TrajectoryKind::Circle => (s * cos, s * sin, -s * w * sin, s * w * cos),
            TrajectoryKind::Figure8 => (
                s * sin,
                s * sin * cos,
                s * w * cos,
                s * w * (cos * cos - sin * sin),
            ),
            TrajectoryKind::Square => self.square(t),
        }
    }

    /// Four straight legs: up b, back along a, down b, forward along a.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn square(&self, t: f64) -> (f64, f64, f64, f64) {
        let s = self.scale;
        let leg = self.period / 4.0;
        let speed = s / leg;
        let cycle_time = t.rem_euclid(self.period);
        let leg_time = cycle_time.rem_euclid(leg);
        let travelled = speed * leg_time;
        match ((cycle_time / leg).floor() as usize).min(3) {
            0 => (0.0, travelled, 0.0, speed),
            1 => (-travelled, s, -speed, 0.0),
            2 => (-s, s - travelled, 0.0, -speed),
            _ => (-s + travelled, 0.0, speed, 0.0),
        }
    }
}

impl TrajectoryGenerator for ParametricTrajectory {
    fn sample(&self, t: f64) -> (Vector3<f64>, Vector3<f64>) {
        let (a, b, a_dot, b_dot) = self.plane_coords(t);
        let mut pos = Vector3::zeros();
        let mut vel = Vector3::zeros();
        pos[self.axes.0] = a + self.offset[0];
        pos[self.axes.1] = b + self.offset[1];
        vel[self.axes.0] = a_dot;
        vel[self.axes.1] = b_dot;
        (pos, vel)
    }
}

// ---------------------------------------------------------------------------
// ReferenceTrajectory
// ---------------------------------------------------------------------------

/// Position and velocity samples at a fixed time step.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTrajectory {
    pub positions: Vec<Vector3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
}

impl ReferenceTrajectory {
    /// Sample `generator` at `t = 0, dt, ..., (samples - 1) dt`.
    #[allow(clippy::cast_precision_loss)]
    pub fn sample(generator: &dyn TrajectoryGenerator, samples: usize, dt: f64) -> Self {
        let (positions, velocities) = (0..samples)
            .map(|i| generator.sample(i as f64 * dt))
            .unzip();
        Self {
            positions,
            velocities,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn circle_xz() -> ParametricTrajectory {
        ParametricTrajectory::new(TrajectoryKind::Circle, 4.0, 1, (0, 2), [0.0, 1.0], 0.5)
    }

    #[test]
    fn circle_starts_on_first_axis() {
        let (pos, vel) = circle_xz().sample(0.0);
        assert_relative_eq!(pos, Vector3::new(0.5, 0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(vel, Vector3::new(0.0, 0.0, 0.5 * TAU / 4.0), epsilon = 1e-12);
    }

    #[test]
    fn circle_keeps_constant_radius_and_speed() {
        let traj = circle_xz();
        let reference = ReferenceTrajectory::sample(&traj, 200, 0.02);
        let expected_speed = 0.5 * TAU / 4.0;
        for (pos, vel) in reference.positions.iter().zip(&reference.velocities) {
            let speed = vel.norm();
            let radius = (pos.x.powi(2) + (pos.z - 1.0).powi(2)).sqrt();
            assert_relative_eq!(radius, 0.5, epsilon = 1e-12);
            assert_relative_eq!(speed, expected_speed, epsilon = 1e-12);
            assert_relative_eq!(pos.y, 0.0);
        }
    }

    #[test]
    fn velocity_matches_finite_difference() {
        for kind in [TrajectoryKind::Circle, TrajectoryKind::Figure8] {
            let traj = ParametricTrajectory::new(kind, 5.0, 2, (2, 0), [0.5, 0.0], -0.5);
            let h = 1e-6;
            for t in [0.1, 0.9, 1.7, 3.3] {
                let (p0, v) = traj.sample(t);
                let (p1, _) = traj.sample(t + h);
                assert_relative_eq!((p1 - p0) / h, v, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn square_visits_corners() {
        let traj =
            ParametricTrajectory::new(TrajectoryKind::Square, 4.0, 1, (0, 1), [0.0, 0.0], 1.0);
        let corner = |t: f64| traj.sample(t).0;
        assert_relative_eq!(corner(0.0), Vector3::new(0.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(corner(1.0), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(corner(2.0), Vector3::new(-1.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(corner(3.0), Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(corner(3.5), Vector3::new(-0.5, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn num_cycles_shortens_period() {
        let traj =
            ParametricTrajectory::new(TrajectoryKind::Circle, 6.0, 3, (0, 1), [0.0, 0.0], 1.0);
        assert_relative_eq!(traj.period(), 2.0);
        let (a, _) = traj.sample(0.0);
        let (b, _) = traj.sample(2.0);
        assert_relative_eq!(a, b, epsilon = 1e-12);
    }

    #[test]
    fn from_task_info_uses_configured_plane() {
        let info = TaskInfoConfig::default();
        let traj = ParametricTrajectory::from_task_info(&info, 5.0).unwrap();
        // "zx" with offset [0.5, 0] and scale -0.5 starts at z = 0, x = 0.
        let (pos, _) = traj.sample(0.0);
        assert_relative_eq!(pos, Vector3::new(0.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn sample_count_and_spacing() {
        let reference = ReferenceTrajectory::sample(&circle_xz(), 7, 0.5);
        assert_eq!(reference.len(), 7);
        assert!(!reference.is_empty());
        let (expected, _) = circle_xz().sample(3.0);
        assert_relative_eq!(reference.positions[6], expected);
    }
}
