//! Deterministic seed derivation for reproducible episodes.
//!
//! ```text
//! Root seed (config `seed`, or the seed passed to an explicit reset)
//! ├── randomization stream (initial state, inertia, track placement)
//! └── Subsystem seed (disturbance noise, ...)
//! ```
//!
//! Child seeds are derived by hashing, so enabling one subsystem never
//! shifts the draws of another.

use std::hash::{DefaultHasher, Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Derive a child seed from a parent seed and a string key.
///
/// # Example
///
/// ```
/// use rotorgym_core::seed::derive_seed;
///
/// let child = derive_seed(42, "disturbance");
/// assert_ne!(child, 42);
/// assert_eq!(child, derive_seed(42, "disturbance"));
/// ```
#[must_use]
pub fn derive_seed(parent: u64, key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    key.hash(&mut hasher);
    hasher.finish()
}

/// Derive a child seed from a parent seed and a numeric index.
#[must_use]
pub fn derive_seed_indexed(parent: u64, index: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    index.hash(&mut hasher);
    hasher.finish()
}

/// Root seed plus helpers to build the RNG streams an environment owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHierarchy {
    root: u64,
}

impl SeedHierarchy {
    #[must_use]
    pub const fn new(root: u64) -> Self {
        Self { root }
    }

    #[must_use]
    pub const fn root(&self) -> u64 {
        self.root
    }

    /// Seed of a named subsystem.
    #[must_use]
    pub fn subsystem_seed(&self, subsystem: &str) -> u64 {
        derive_seed(self.root, subsystem)
    }

    /// Seed for the `episode`-th episode after the root was set.
    #[must_use]
    pub fn episode_seed(&self, episode: u64) -> u64 {
        derive_seed_indexed(self.root, episode)
    }

    /// RNG driving randomization, seeded directly from the root.
    #[must_use]
    pub fn randomization_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.root)
    }

    /// RNG for a named subsystem.
    #[must_use]
    pub fn subsystem_rng(&self, subsystem: &str) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.subsystem_seed(subsystem))
    }
}
