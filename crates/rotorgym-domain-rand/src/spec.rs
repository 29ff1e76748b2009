//! Named collections of randomization ranges and their built-in defaults.

use std::collections::BTreeMap;

use rand::Rng;
use rotorgym_core::config::DistributionSpec;
use rotorgym_core::{ConfigError, Fidelity};
use serde::Serialize;

use crate::ranges::{RandomizationRange, RangeError};

/// Parameter name to distribution. Samples are added to nominal values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RandomizationSpec {
    ranges: BTreeMap<String, RandomizationRange>,
}

impl RandomizationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add or replace the range for `name`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, range: RandomizationRange) -> Self {
        self.ranges.insert(name.into(), range);
        self
    }

    /// Resolve a configured table. Every key must be one of `allowed`.
    pub fn from_table(
        section: &str,
        table: &BTreeMap<String, DistributionSpec>,
        allowed: &[&str],
    ) -> Result<Self, ConfigError> {
        let mut ranges = BTreeMap::new();
        for (name, spec) in table {
            let field = format!("{section}.{name}");
            if !allowed.contains(&name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field,
                    message: format!("not randomizable (expected one of {allowed:?})"),
                });
            }
            let range = RandomizationRange::from_spec(spec).map_err(|e| range_error(field, e))?;
            ranges.insert(name.clone(), range);
        }
        Ok(Self { ranges })
    }

    pub fn get(&self, name: &str) -> Option<&RandomizationRange> {
        self.ranges.get(name)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RandomizationRange)> {
        self.ranges.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Add one independent draw to each named value that has a range.
    /// Values without a range pass through unchanged. Draws happen in
    /// the order of `nominal`.
    pub fn perturb<R: Rng + ?Sized>(
        &self,
        nominal: &[(&'static str, f64)],
        rng: &mut R,
    ) -> Vec<(&'static str, f64)> {
        nominal
            .iter()
            .map(|&(name, value)| match self.ranges.get(name) {
                Some(range) => (name, value + range.sample(rng)),
                None => (name, value),
            })
            .collect()
    }
}

pub(crate) fn range_error(field: String, err: RangeError) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        message: err.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Built-in tables
// ---------------------------------------------------------------------------

fn uniform(low: f64, high: f64) -> RandomizationRange {
    RandomizationRange::Uniform { low, high }
}

/// Default initial-state perturbations, restricted to the labels that
/// exist at `fidelity`.
pub fn default_init_state_spec(fidelity: Fidelity) -> RandomizationSpec {
    let table = [
        ("init_x", uniform(-0.5, 0.5)),
        ("init_x_dot", uniform(-0.01, 0.01)),
        ("init_y", uniform(-0.5, 0.5)),
        ("init_y_dot", uniform(-0.01, 0.01)),
        ("init_z", uniform(0.1, 1.5)),
        ("init_z_dot", uniform(-0.01, 0.01)),
        ("init_phi", uniform(-0.3, 0.3)),
        ("init_theta", uniform(-0.3, 0.3)),
        ("init_psi", uniform(-0.3, 0.3)),
        ("init_p", uniform(-0.01, 0.01)),
        ("init_q", uniform(-0.01, 0.01)),
        ("init_r", uniform(-0.01, 0.01)),
        ("init_theta_dot", uniform(-0.01, 0.01)),
    ];
    restricted(&table, fidelity.init_state_labels())
}

/// Default inertial perturbations, as offsets around the Crazyflie
/// nominal values.
pub fn default_inertial_spec(fidelity: Fidelity) -> RandomizationSpec {
    let table = [
        ("M", uniform(-0.005, 0.005)),
        ("Ixx", uniform(-1.0e-6, 1.0e-6)),
        ("Iyy", uniform(-1.0e-6, 1.0e-6)),
        ("Izz", uniform(-1.0e-6, 1.0e-6)),
    ];
    restricted(&table, fidelity.inertial_labels())
}

fn restricted(table: &[(&str, RandomizationRange)], labels: &[&str]) -> RandomizationSpec {
    table
        .iter()
        .filter(|(name, _)| labels.contains(name))
        .fold(RandomizationSpec::new(), |spec, (name, range)| {
            spec.with(*name, *range)
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    // -- Defaults --

    #[test]
    fn default_init_tables_match_fidelity_labels() {
        for fidelity in [Fidelity::OneD, Fidelity::TwoD, Fidelity::ThreeD] {
            let spec = default_init_state_spec(fidelity);
            assert_eq!(spec.len(), fidelity.state_dim(), "{fidelity}");
            for label in fidelity.init_state_labels() {
                assert!(spec.get(label).is_some(), "{fidelity} missing {label}");
            }
        }
    }

    #[test]
    fn default_inertial_tables_match_fidelity_labels() {
        assert_eq!(default_inertial_spec(Fidelity::OneD).len(), 1);
        let planar = default_inertial_spec(Fidelity::TwoD);
        assert!(planar.get("Iyy").is_some());
        assert!(planar.get("Ixx").is_none());
        assert_eq!(default_inertial_spec(Fidelity::ThreeD).len(), 4);
    }

    // -- from_table --

    #[test]
    fn from_table_rejects_unknown_label() {
        let mut table = BTreeMap::new();
        table.insert("init_y".to_string(), DistributionSpec::Fixed { value: 0.1 });
        let err = RandomizationSpec::from_table(
            "randomization.init_state.info",
            &table,
            Fidelity::TwoD.init_state_labels(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn from_table_rejects_bad_distribution() {
        let mut table = BTreeMap::new();
        table.insert("M".to_string(), DistributionSpec::Normal { loc: 0.0, scale: -1.0 });
        let err = RandomizationSpec::from_table("inertial", &table, &["M"]).unwrap_err();
        assert!(err.to_string().contains("inertial.M"));
    }

    // -- perturb --

    #[test]
    fn perturb_is_additive_and_keeps_order() {
        let spec = RandomizationSpec::new()
            .with("init_z", RandomizationRange::Fixed { value: 0.5 });
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let out = spec.perturb(&[("init_z", 1.0), ("init_z_dot", 0.2)], &mut rng);
        assert_eq!(out, vec![("init_z", 1.5), ("init_z_dot", 0.2)]);
    }

    #[test]
    fn perturb_is_deterministic_per_seed() {
        let spec = default_init_state_spec(Fidelity::ThreeD);
        let nominal: Vec<_> = Fidelity::ThreeD
            .init_state_labels()
            .iter()
            .map(|l| (*l, 0.0))
            .collect();
        let a = spec.perturb(&nominal, &mut ChaCha8Rng::seed_from_u64(7));
        let b = spec.perturb(&nominal, &mut ChaCha8Rng::seed_from_u64(7));
        let c = spec.perturb(&nominal, &mut ChaCha8Rng::seed_from_u64(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn iter_yields_names() {
        let spec = RandomizationSpec::new().with("M", RandomizationRange::Fixed { value: 0.0 });
        assert_eq!(spec.iter().count(), 1);
        assert_eq!(spec.iter().next().map(|(k, _)| k), Some("M"));
    }
}
