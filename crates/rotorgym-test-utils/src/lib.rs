//! Shared test fixtures and utilities for rotorgym crates.
//!
//! Provides a scriptable physics engine, configuration fixtures and
//! deterministic RNG setup.

pub mod fixtures;
pub mod mocks;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use fixtures::{competition_config, hover_config, square_track, tracking_config};
pub use mocks::{EngineCall, ScriptedEngine};
pub use rng::{deterministic_vec, seeded_rng};
