// rotorgym-core: Types, traits, config, seeds and errors for the rotorgym quadrotor environment.

pub mod config;
pub mod error;
pub mod seed;
pub mod traits;
pub mod types;

pub use error::{ConfigError, RotorgymError, SimError, ValidationError};
pub use types::{
    Action, BodyId, BodyState, BoxSpace, Contact, CostKind, Fidelity, Observation, Pose,
    StaticBody, TaskKind,
};
