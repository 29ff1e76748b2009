use thiserror::Error;

/// Top-level error type for rotorgym.
#[derive(Debug, Error)]
pub enum RotorgymError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration errors, raised while building an environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported fidelity level: {0} (expected 1, 2 or 3)")]
    UnsupportedFidelity(u8),

    #[error("pyb_freq ({pyb_freq}) must be a positive multiple of ctrl_freq ({ctrl_freq})")]
    InvalidFrequencies { ctrl_freq: u32, pyb_freq: u32 },

    #[error("Invalid initial state override: {0}")]
    InvalidInitialState(String),

    #[error("Invalid inertial property override: {0}")]
    InvalidInertialOverride(String),

    #[error("Length mismatch for {field}: expected {expected}, got {got}")]
    DimensionMismatch {
        field: String,
        expected: usize,
        got: usize,
    },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Incompatible configuration: {0}")]
    Incompatible(String),
}

/// Errors raised while resetting or stepping an episode.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Physics diverged: NaN detected in state")]
    PhysicsDiverged,

    #[error("Non-physical value for {name}: {value} (must be >= 0)")]
    NonPhysicalParameter { name: String, value: f64 },

    #[error("Initial target gate {requested} out of range (gate count {count})")]
    GateOutOfRange { requested: usize, count: usize },

    #[error("Unknown gate type code: {0}")]
    UnknownGateType(i64),

    #[error("Body not found: {0}")]
    BodyNotFound(u32),

    #[error("step() called before reset()")]
    NotReset,

    #[error("step() called after the episode ended; call reset()")]
    EpisodeFinished,
}

/// Action validation errors.
///
/// Copy + static messages for cheap propagation in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Action dimension mismatch: expected {expected}, got {got}")]
    ActionDimMismatch { expected: usize, got: usize },

    #[error("Action contains NaN")]
    ActionContainsNan,

    #[error("Action contains Inf")]
    ActionContainsInf,
}
