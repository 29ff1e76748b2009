//! Concrete randomizers for the quantities drawn at every reset.
//!
//! Each randomizer wraps the ranges it samples from and exposes a method
//! that takes nominal values plus an RNG and returns the drawn values.
//! Nothing is mutated in place, so a failed draw leaves the caller's state
//! untouched.

use rand::Rng;
use rotorgym_core::config::{PoseRandomizationInfo, VehicleConfig};
use rotorgym_core::{ConfigError, Fidelity, SimError};
use serde::Serialize;

use crate::ranges::RandomizationRange;
use crate::spec::{RandomizationSpec, range_error};

// ---------------------------------------------------------------------------
// InertialProperties
// ---------------------------------------------------------------------------

/// Mass and principal moments of inertia of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InertialProperties {
    pub mass: f64,
    pub ixx: f64,
    pub iyy: f64,
    pub izz: f64,
}

impl InertialProperties {
    pub const fn inertia(&self) -> [f64; 3] {
        [self.ixx, self.iyy, self.izz]
    }

    fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("M", self.mass),
            ("Ixx", self.ixx),
            ("Iyy", self.iyy),
            ("Izz", self.izz),
        ]
    }
}

impl From<&VehicleConfig> for InertialProperties {
    fn from(vehicle: &VehicleConfig) -> Self {
        Self {
            mass: vehicle.mass,
            ixx: vehicle.ixx,
            iyy: vehicle.iyy,
            izz: vehicle.izz,
        }
    }
}

// ---------------------------------------------------------------------------
// InertialRandomizer
// ---------------------------------------------------------------------------

/// Perturbs mass and inertia.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InertialRandomizer {
    pub spec: RandomizationSpec,
}

impl InertialRandomizer {
    pub const fn new(spec: RandomizationSpec) -> Self {
        Self { spec }
    }

    /// Draw perturbed properties. Fails if any result is negative; the
    /// caller must then abort the reset.
    pub fn randomize<R: Rng + ?Sized>(
        &self,
        nominal: &InertialProperties,
        rng: &mut R,
    ) -> Result<InertialProperties, SimError> {
        let drawn = self.spec.perturb(&nominal.named(), rng);
        if let Some(&(name, value)) = drawn.iter().find(|(_, v)| *v < 0.0 || v.is_nan()) {
            return Err(SimError::NonPhysicalParameter {
                name: name.into(),
                value,
            });
        }
        Ok(InertialProperties {
            mass: drawn[0].1,
            ixx: drawn[1].1,
            iyy: drawn[2].1,
            izz: drawn[3].1,
        })
    }
}

// ---------------------------------------------------------------------------
// InitStateRandomizer
// ---------------------------------------------------------------------------

/// Perturbs the initial kinematic state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InitStateRandomizer {
    pub spec: RandomizationSpec,
}

impl InitStateRandomizer {
    pub const fn new(spec: RandomizationSpec) -> Self {
        Self { spec }
    }

    pub fn randomize<R: Rng + ?Sized>(
        &self,
        nominal: &[(&'static str, f64)],
        rng: &mut R,
    ) -> Vec<(&'static str, f64)> {
        self.spec.perturb(nominal, rng)
    }
}

// ---------------------------------------------------------------------------
// PoseRandomizer
// ---------------------------------------------------------------------------

/// Planar offset applied to a gate or obstacle when it is placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PoseOffset {
    pub dx: f64,
    pub dy: f64,
    pub dyaw: f64,
}

/// Draws placement offsets for gates and obstacles. One distribution per
/// category drives x, y and yaw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoseRandomizer {
    pub gates: RandomizationRange,
    pub obstacles: RandomizationRange,
}

impl PoseRandomizer {
    pub fn from_info(info: &PoseRandomizationInfo) -> Result<Self, ConfigError> {
        let field = "randomization.gates_and_obstacles.info";
        Ok(Self {
            gates: RandomizationRange::from_spec(&info.gates)
                .map_err(|e| range_error(format!("{field}.gates"), e))?,
            obstacles: RandomizationRange::from_spec(&info.obstacles)
                .map_err(|e| range_error(format!("{field}.obstacles"), e))?,
        })
    }

    pub fn gate_offset<R: Rng + ?Sized>(&self, rng: &mut R) -> PoseOffset {
        offset(&self.gates, rng)
    }

    pub fn obstacle_offset<R: Rng + ?Sized>(&self, rng: &mut R) -> PoseOffset {
        offset(&self.obstacles, rng)
    }
}

fn offset<R: Rng + ?Sized>(range: &RandomizationRange, rng: &mut R) -> PoseOffset {
    let dx = range.sample(rng);
    let dy = range.sample(rng);
    let dyaw = range.sample(rng);
    PoseOffset { dx, dy, dyaw }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl InertialRandomizer {
    pub fn default_for(fidelity: Fidelity) -> Self {
        Self::new(crate::spec::default_inertial_spec(fidelity))
    }
}

impl InitStateRandomizer {
    pub fn default_for(fidelity: Fidelity) -> Self {
        Self::new(crate::spec::default_init_state_spec(fidelity))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
