use acre_core::CoreError;

/// Result alias for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised while driving a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A location operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Config or script JSON did not parse.
    #[error("invalid simulation config: {0}")]
    Config(#[from] serde_json::Error),

    /// A frame needs an active location and none is set.
    #[error("no active location set")]
    NoActiveLocation,

    /// A day step gave up.
    #[error("day step '{step}' failed: {reason}")]
    StepFailed {
        /// Step name.
        step: String,
        /// What went wrong.
        reason: String,
    },
}
