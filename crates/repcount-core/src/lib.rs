//! Rep counting core: joint angles, per-exercise state machines and a
//! session-keyed registry.
//!
//! # Modules
//! - `geometry`: angle at a vertex from three 2D points
//! - `landmarks`: joint names, per-frame observations, mirrored lookup
//! - `counter`: push-up / squat / sit-up hysteresis counters
//! - `session`: one counter plus frame-ordering bookkeeping
//! - `registry`: sharded `(session, exercise)` map with optional eviction
//! - `engine`: validating boundary over the registry
//! - `config`: TOML + environment configuration
//!
//! # Example
//! ```rust
//! use repcount_core::{FrameRequest, RepEngine};
//!
//! let engine = RepEngine::new();
//! let report = engine.process(&FrameRequest::new("user-1", "Squat")).unwrap();
//! assert!(!report.landmarks_detected);
//! assert_eq!(engine.snapshot()["user-1_squat"].count, 0);
//! ```

pub mod config;
pub mod counter;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod landmarks;
pub mod registry;
pub mod session;

pub use config::{
    ConfigError, LandmarkConfig, PushupConfig, RegistryConfig, RepcountConfig, SitupConfig,
    SquatConfig,
};
pub use counter::{
    calories_for, Diagnostics, ExerciseCounter, ExerciseKind, PushupCounter, RepCounter,
    RepReport, RepState, SitupCounter, SquatCounter, Stage,
};
pub use engine::{ExerciseInfo, FrameRequest, RepEngine};
pub use error::EngineError;
pub use geometry::joint_angle;
pub use landmarks::{JointName, JointPoint, LandmarkResolver, PoseFrame};
pub use registry::{SessionHandle, SessionKey, SessionRegistry};
pub use session::{FrameReport, TrackedSession};

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod tests_proptest;
