use thiserror::Error;

use crate::config::ConfigError;

/// Caller-facing failures at the engine boundary.
///
/// Missing joints are not an error: they surface as feedback on an
/// otherwise normal report.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unsupported exercise type: {given}. Supported: {supported}")]
    UnsupportedExerciseType { given: String, supported: String },
    #[error("session_id required")]
    MissingSessionId,
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
