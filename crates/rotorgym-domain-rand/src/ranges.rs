//! Randomization ranges for parameter sampling.
//!
//! A [`RandomizationRange`] describes how a single scalar is drawn. Ranges
//! are validated when built, so [`sample`](RandomizationRange::sample)
//! never fails.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use rotorgym_core::config::DistributionSpec;
use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from constructing a randomization range.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RangeError {
    #[error("invalid bounds: low ({low}) >= high ({high})")]
    InvalidBounds { low: f64, high: f64 },

    #[error("invalid standard deviation: {0} (must be >= 0 and finite)")]
    InvalidStd(f64),

    #[error("log-uniform bounds must be positive: low={low}, high={high}")]
    NonPositiveBounds { low: f64, high: f64 },

    #[error("value is not finite: {0}")]
    NonFinite(f64),
}

// ---------------------------------------------------------------------------
// RandomizationRange
// ---------------------------------------------------------------------------

/// Distribution of one randomized quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "distrib", rename_all = "snake_case")]
pub enum RandomizationRange {
    /// Always returns the same value.
    Fixed { value: f64 },

    /// Uniform distribution over `[low, high)`.
    Uniform { low: f64, high: f64 },

    /// Gaussian with mean `loc` and standard deviation `scale`.
    Normal { loc: f64, scale: f64 },

    /// `exp(Uniform(ln(low), ln(high)))`.
    LogUniform { low: f64, high: f64 },
}

impl RandomizationRange {
    pub const fn fixed(value: f64) -> Result<Self, RangeError> {
        if !value.is_finite() {
            return Err(RangeError::NonFinite(value));
        }
        Ok(Self::Fixed { value })
    }

    pub fn uniform(low: f64, high: f64) -> Result<Self, RangeError> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(RangeError::InvalidBounds { low, high });
        }
        Ok(Self::Uniform { low, high })
    }

    pub fn gaussian(loc: f64, scale: f64) -> Result<Self, RangeError> {
        if !scale.is_finite() || scale < 0.0 {
            return Err(RangeError::InvalidStd(scale));
        }
        if !loc.is_finite() {
            return Err(RangeError::NonFinite(loc));
        }
        Ok(Self::Normal { loc, scale })
    }

    pub fn log_uniform(low: f64, high: f64) -> Result<Self, RangeError> {
        if low <= 0.0 || high <= 0.0 {
            return Err(RangeError::NonPositiveBounds { low, high });
        }
        if !high.is_finite() || low >= high {
            return Err(RangeError::InvalidBounds { low, high });
        }
        Ok(Self::LogUniform { low, high })
    }

    /// Resolve a configured distribution, validating its parameters.
    pub fn from_spec(spec: &DistributionSpec) -> Result<Self, RangeError> {
        match *spec {
            DistributionSpec::Fixed { value } => Self::fixed(value),
            DistributionSpec::Uniform { low, high } => Self::uniform(low, high),
            DistributionSpec::Normal { loc, scale } => Self::gaussian(loc, scale),
            DistributionSpec::LogUniform { low, high } => Self::log_uniform(low, high),
        }
    }

    /// Draw one value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Self::Fixed { value } => value,
            Self::Uniform { low, high } => rng.gen_range(low..high),
            Self::Normal { loc, scale } => {
                if scale == 0.0 {
                    return loc;
                }
                Normal::new(loc, scale).map_or(loc, |dist| dist.sample(rng))
            }
            Self::LogUniform { low, high } => rng.gen_range(low.ln()..high.ln()).exp(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
