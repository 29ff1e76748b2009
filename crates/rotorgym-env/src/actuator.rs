//! Action preprocessing: validation, clipping and the normalized thrust map.

use rotorgym_core::config::EnvConfig;
use rotorgym_core::{Action, BoxSpace, ValidationError};
use tracing::warn;

/// How a clipped action becomes per-actuator thrust.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThrustMapping {
    /// The action is thrust in newtons.
    Direct,
    /// `thrust = (1 + scale * a) * hover` for `a` in `[-1, 1]`.
    Normalized { scale: f64, hover: f64 },
}

/// Turns agent actions into the thrust commands the motors receive.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPreprocessor {
    space: BoxSpace,
    mapping: ThrustMapping,
}

impl ActionPreprocessor {
    /// Actions are thrusts bounded by `[low, high]` on every actuator.
    pub fn direct(dim: usize, low: f64, high: f64) -> Self {
        Self {
            space: BoxSpace::uniform(dim, low, high),
            mapping: ThrustMapping::Direct,
        }
    }

    /// Actions live in `[-1, 1]` and scale thrust around `hover`.
    pub fn normalized(dim: usize, scale: f64, hover: f64) -> Self {
        Self {
            space: BoxSpace::uniform(dim, -1.0, 1.0),
            mapping: ThrustMapping::Normalized { scale, hover },
        }
    }

    /// `hover` is the per-actuator hover thrust; `limits` the per-actuator
    /// thrust range of the motors.
    pub fn from_config(config: &EnvConfig, hover: f64, limits: (f64, f64)) -> Self {
        let dim = config.fidelity.action_dim();
        if config.normalized_action_space {
            Self::normalized(dim, config.norm_act_scale, hover)
        } else {
            Self::direct(dim, limits.0, limits.1)
        }
    }

    /// The space agents sample actions from.
    pub const fn action_space(&self) -> &BoxSpace {
        &self.space
    }

    pub const fn mapping(&self) -> ThrustMapping {
        self.mapping
    }

    /// Validate, clip and map `action` to thrust. Clipping is reported
    /// with a warning and is otherwise silent.
    pub fn preprocess(&self, action: &Action) -> Result<Vec<f64>, ValidationError> {
        action.validate(self.space.dim())?;
        let clipped = self.space.clip(action.as_slice());
        if clipped.as_slice() != action.as_slice() {
            warn!(action = ?action.as_slice(), ?clipped, "action was clipped");
        }
        Ok(match self.mapping {
            ThrustMapping::Direct => clipped,
            ThrustMapping::Normalized { scale, hover } => {
                clipped.iter().map(|a| (1.0 + scale * a) * hover).collect()
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
