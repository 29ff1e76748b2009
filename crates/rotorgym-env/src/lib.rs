//! Simulated quadrotor environment for reinforcement learning and control.
//!
//! [`QuadrotorEnv`] wraps a [`PhysicsEngine`](rotorgym_core::traits::PhysicsEngine)
//! with the task logic: action preprocessing, disturbances, the gate track,
//! rewards, termination and the info reported to controllers.

pub mod actuator;
pub mod disturbance;
pub mod env;
pub mod episode;
pub mod info;
pub mod rewards;
pub mod spaces;
pub mod stats;
pub mod terminations;
pub mod track;

pub use env::{QuadrotorEnv, ResetOptions};
pub use episode::{Episode, EpisodePhase};
pub use info::{ResetInfo, ResetResult, StepInfo, StepResult};
pub use rewards::RewardPolicy;
pub use stats::EpisodeStats;
pub use terminations::TerminationCause;
pub use track::{GateKind, Track};

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        env::{QuadrotorEnv, ResetOptions},
        episode::{Episode, EpisodePhase},
        info::{ResetInfo, ResetResult, StepInfo, StepResult},
        stats::EpisodeStats,
        terminations::TerminationCause,
    };
}
