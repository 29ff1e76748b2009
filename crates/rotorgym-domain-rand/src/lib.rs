//! Initial-state, inertial and track randomization.
//!
//! Distributions are resolved from the configuration once, when the
//! environment is built. At every reset the environment passes its episode
//! RNG to the enabled randomizers, so draws are reproducible per seed.

pub mod randomizers;
pub mod ranges;
pub mod spec;

use rotorgym_core::config::RandomizationConfig;
use rotorgym_core::{ConfigError, Fidelity};
use serde::Serialize;

use crate::randomizers::{InertialRandomizer, InitStateRandomizer, PoseRandomizer};

pub use randomizers::{InertialProperties, PoseOffset};
pub use ranges::{RandomizationRange, RangeError};
pub use spec::RandomizationSpec;

// ---------------------------------------------------------------------------
// DomainRandomizer
// ---------------------------------------------------------------------------

/// The enabled randomizers of one environment. `None` means disabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DomainRandomizer {
    pub init_state: Option<InitStateRandomizer>,
    pub inertial: Option<InertialRandomizer>,
    pub poses: Option<PoseRandomizer>,
}

impl DomainRandomizer {
    /// Resolve the configured sections for `fidelity`. Enabled sections
    /// without an `info` table use the built-in defaults, except gate and
    /// obstacle placement, which has none.
    pub fn from_config(
        config: &RandomizationConfig,
        fidelity: Fidelity,
    ) -> Result<Self, ConfigError> {
        let init_state = if config.init_state.enabled {
            Some(match &config.init_state.info {
                Some(table) => InitStateRandomizer::new(RandomizationSpec::from_table(
                    "randomization.init_state.info",
                    table,
                    fidelity.init_state_labels(),
                )?),
                None => InitStateRandomizer::default_for(fidelity),
            })
        } else {
            None
        };

        let inertial = if config.inertial_prop.enabled {
            Some(match &config.inertial_prop.info {
                Some(table) => InertialRandomizer::new(RandomizationSpec::from_table(
                    "randomization.inertial_prop.info",
                    table,
                    fidelity.inertial_labels(),
                )?),
                None => InertialRandomizer::default_for(fidelity),
            })
        } else {
            None
        };

        let poses = if config.gates_and_obstacles.enabled {
            let info = config.gates_and_obstacles.info.as_ref().ok_or_else(|| {
                ConfigError::MissingField("randomization.gates_and_obstacles.info".into())
            })?;
            Some(PoseRandomizer::from_info(info)?)
        } else {
            None
        };

        Ok(Self {
            init_state,
            inertial,
            poses,
        })
    }

    /// Whether any section draws at reset.
    pub const fn is_enabled(&self) -> bool {
        self.init_state.is_some() || self.inertial.is_some() || self.poses.is_some()
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        DomainRandomizer,
        randomizers::{
            InertialProperties, InertialRandomizer, InitStateRandomizer, PoseOffset,
            PoseRandomizer,
        },
        ranges::{RandomizationRange, RangeError},
        spec::RandomizationSpec,
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
