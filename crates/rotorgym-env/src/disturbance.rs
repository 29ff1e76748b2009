//! Additive disturbances on observations, actions and dynamics.
//!
//! Noise draws come from a dedicated RNG stream so that enabling a
//! disturbance never shifts the randomization draws of a reset.

use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use rotorgym_core::config::{DisturbanceConfig, DisturbanceSpec, broadcast_weights};
use rotorgym_core::{ConfigError, Fidelity};

// ---------------------------------------------------------------------------
// Disturbance
// ---------------------------------------------------------------------------

/// One resolved disturbance source of a fixed dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum Disturbance {
    WhiteNoise { std: Vec<f64> },
    /// Active on control steps `[start, start + duration)`.
    Impulse {
        magnitude: f64,
        start: u64,
        duration: u64,
    },
    /// Active from control step `start` on.
    Step { magnitude: f64, start: u64 },
}

impl Disturbance {
    pub fn from_spec(field: &str, spec: &DisturbanceSpec, dim: usize) -> Result<Self, ConfigError> {
        Ok(match spec {
            DisturbanceSpec::WhiteNoise { std } => {
                let std = broadcast_weights(&format!("{field}.std"), std, dim)?;
                if std.iter().any(|s| !s.is_finite() || *s < 0.0) {
                    return Err(ConfigError::InvalidValue {
                        field: format!("{field}.std"),
                        message: "must be finite and >= 0".into(),
                    });
                }
                Self::WhiteNoise { std }
            }
            DisturbanceSpec::Impulse {
                magnitude,
                step_offset,
                duration,
            } => Self::Impulse {
                magnitude: *magnitude,
                start: *step_offset,
                duration: *duration,
            },
            DisturbanceSpec::Step {
                magnitude,
                step_offset,
            } => Self::Step {
                magnitude: *magnitude,
                start: *step_offset,
            },
        })
    }

    /// Add this source's contribution at control step `step` to `values`.
    pub fn apply<R: Rng + ?Sized>(&self, values: &mut [f64], step: u64, rng: &mut R) {
        match self {
            Self::WhiteNoise { std } => {
                for (v, s) in values.iter_mut().zip(std) {
                    *v += Normal::new(0.0, *s).map_or(0.0, |n| n.sample(rng));
                }
            }
            Self::Impulse {
                magnitude,
                start,
                duration,
            } => {
                if (*start..start.saturating_add(*duration)).contains(&step) {
                    values.iter_mut().for_each(|v| *v += magnitude);
                }
            }
            Self::Step { magnitude, start } => {
                if step >= *start {
                    values.iter_mut().for_each(|v| *v += magnitude);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DisturbanceChannel
// ---------------------------------------------------------------------------

/// Every source acting on one signal, applied in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisturbanceChannel {
    dim: usize,
    sources: Vec<Disturbance>,
}

impl DisturbanceChannel {
    pub fn from_specs(
        field: &str,
        specs: &[DisturbanceSpec],
        dim: usize,
    ) -> Result<Self, ConfigError> {
        let sources = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| Disturbance::from_spec(&format!("{field}[{i}]"), spec, dim))
            .collect::<Result<_, _>>()?;
        Ok(Self { dim, sources })
    }

    pub const fn dim(&self) -> usize {
        self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn apply<R: Rng + ?Sized>(&self, values: &mut [f64], step: u64, rng: &mut R) {
        for source in &self.sources {
            source.apply(values, step, rng);
        }
    }
}

// ---------------------------------------------------------------------------
// Disturbances
// ---------------------------------------------------------------------------

/// The three disturbance channels of an environment and their RNG.
#[derive(Debug, Clone)]
pub struct Disturbances {
    pub observation: DisturbanceChannel,
    pub action: DisturbanceChannel,
    pub dynamics: DisturbanceChannel,
    fidelity: Fidelity,
    rng: ChaCha8Rng,
}

impl Disturbances {
    pub fn from_config(
        config: &DisturbanceConfig,
        fidelity: Fidelity,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            observation: DisturbanceChannel::from_specs(
                "disturbances.observation",
                &config.observation,
                fidelity.state_dim(),
            )?,
            action: DisturbanceChannel::from_specs(
                "disturbances.action",
                &config.action,
                fidelity.action_dim(),
            )?,
            dynamics: DisturbanceChannel::from_specs(
                "disturbances.dynamics",
                &config.dynamics,
                fidelity.force_dim(),
            )?,
            fidelity,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn apply_observation(&mut self, values: &mut [f64], step: u64) {
        self.observation.apply(values, step, &mut self.rng);
    }

    pub fn apply_action(&mut self, values: &mut [f64], step: u64) {
        self.action.apply(values, step, &mut self.rng);
    }

    /// World-frame external force for this step, or `None` without
    /// dynamics disturbances. 1D forces act on z, 2D forces on x and z.
    pub fn dynamics_force(&mut self, step: u64) -> Option<Vector3<f64>> {
        if self.dynamics.is_empty() {
            return None;
        }
        let mut f = vec![0.0; self.dynamics.dim()];
        self.dynamics.apply(&mut f, step, &mut self.rng);
        Some(match (self.fidelity, f.as_slice()) {
            (Fidelity::OneD, [fz]) => Vector3::new(0.0, 0.0, *fz),
            (Fidelity::TwoD, [fx, fz]) => Vector3::new(*fx, 0.0, *fz),
            (_, [fx, fy, fz]) => Vector3::new(*fx, *fy, *fz),
            _ => Vector3::zeros(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rotorgym_test_utils::seeded_rng;

    // -- Sources --

    #[test]
    fn impulse_is_active_for_its_duration() {
        let d = Disturbance::Impulse {
            magnitude: 0.5,
            start: 2,
            duration: 3,
        };
        let mut rng = seeded_rng(0);
        let active: Vec<bool> = (0..7)
            .map(|step| {
                let mut v = [0.0];
                d.apply(&mut v, step, &mut rng);
                v[0] != 0.0
            })
            .collect();
        assert_eq!(active, vec![false, false, true, true, true, false, false]);
    }

    #[test]
    fn step_stays_on() {
        let d = Disturbance::Step {
            magnitude: -1.0,
            start: 4,
        };
        let mut rng = seeded_rng(0);
        let mut v = [1.0, 2.0];
        d.apply(&mut v, 3, &mut rng);
        assert_eq!(v, [1.0, 2.0]);
        d.apply(&mut v, 100, &mut rng);
        assert_eq!(v, [0.0, 1.0]);
    }

    #[test]
    fn white_noise_is_seeded() {
        let d = Disturbance::from_spec(
            "noise",
            &DisturbanceSpec::WhiteNoise { std: vec![0.1] },
            3,
        )
        .unwrap();
        let draw = |seed| {
            let mut v = [0.0; 3];
            d.apply(&mut v, 0, &mut seeded_rng(seed));
            v
        };
        assert_eq!(draw(5), draw(5));
        assert_ne!(draw(5), draw(6));
    }

    #[test]
    fn zero_std_noise_is_silent() {
        let d = Disturbance::WhiteNoise { std: vec![0.0; 2] };
        let mut v = [1.0, 1.0];
        d.apply(&mut v, 0, &mut seeded_rng(1));
        assert_eq!(v, [1.0, 1.0]);
    }

    #[test]
    fn white_noise_std_length_is_checked() {
        let spec = DisturbanceSpec::WhiteNoise { std: vec![0.1, 0.2] };
        assert!(matches!(
            Disturbance::from_spec("noise", &spec, 3),
            Err(ConfigError::DimensionMismatch { .. })
        ));
        let spec = DisturbanceSpec::WhiteNoise { std: vec![-0.1] };
        assert!(Disturbance::from_spec("noise", &spec, 3).is_err());
    }

    // -- Channels --

    #[test]
    fn dynamics_force_embeds_by_fidelity() {
        let config = DisturbanceConfig {
            dynamics: vec![DisturbanceSpec::Step {
                magnitude: 0.2,
                step_offset: 0,
            }],
            ..DisturbanceConfig::default()
        };
        let mut d = Disturbances::from_config(&config, Fidelity::OneD, 0).unwrap();
        assert_eq!(d.dynamics_force(0), Some(Vector3::new(0.0, 0.0, 0.2)));
        let mut d = Disturbances::from_config(&config, Fidelity::TwoD, 0).unwrap();
        assert_eq!(d.dynamics_force(0), Some(Vector3::new(0.2, 0.0, 0.2)));
        let mut d = Disturbances::from_config(&config, Fidelity::ThreeD, 0).unwrap();
        assert_eq!(d.dynamics_force(0), Some(Vector3::new(0.2, 0.2, 0.2)));
    }

    #[test]
    fn no_dynamics_disturbance_means_no_force() {
        let mut d =
            Disturbances::from_config(&DisturbanceConfig::default(), Fidelity::ThreeD, 0).unwrap();
        assert!(d.dynamics_force(10).is_none());
        let mut obs = [1.0; 12];
        d.apply_observation(&mut obs, 0);
        assert_eq!(obs, [1.0; 12]);
    }

    #[test]
    fn reseed_repeats_noise() {
        let config = DisturbanceConfig {
            action: vec![DisturbanceSpec::WhiteNoise { std: vec![0.05] }],
            ..DisturbanceConfig::default()
        };
        let mut d = Disturbances::from_config(&config, Fidelity::TwoD, 9).unwrap();
        let mut first = [0.0; 2];
        d.apply_action(&mut first, 0);
        d.reseed(9);
        let mut again = [0.0; 2];
        d.apply_action(&mut again, 0);
        assert_eq!(first, again);
    }
}
