//! Projection of planar reference trajectories onto an arbitrary plane.

use nalgebra::{Unit, Vector3};
use rotorgym_core::ConfigError;

use crate::trajectory::ReferenceTrajectory;

/// Orthogonal projection onto the plane through `point` with unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneProjection {
    point: Vector3<f64>,
    normal: Unit<Vector3<f64>>,
}

impl PlaneProjection {
    pub fn new(point: [f64; 3], normal: [f64; 3]) -> Result<Self, ConfigError> {
        let normal = Unit::try_new(Vector3::from(normal), 1e-12).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "task_info.proj_normal".into(),
                message: "must be non-zero".into(),
            }
        })?;
        Ok(Self {
            point: Vector3::from(point),
            normal,
        })
    }

    pub fn project_position(&self, p: &Vector3<f64>) -> Vector3<f64> {
        let n = self.normal.into_inner();
        p - n * (p - self.point).dot(&n)
    }

    pub fn project_velocity(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let n = self.normal.into_inner();
        v - n * v.dot(&n)
    }

    /// Project every sample of `reference`.
    pub fn apply(&self, reference: &ReferenceTrajectory) -> ReferenceTrajectory {
        ReferenceTrajectory {
            positions: reference
                .positions
                .iter()
                .map(|p| self.project_position(p))
                .collect(),
            velocities: reference
                .velocities
                .iter()
                .map(|v| self.project_velocity(v))
                .collect(),
        }
    }
}
