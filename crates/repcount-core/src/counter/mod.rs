//! Rep Counters: per-exercise hysteresis state machines
//!
//! # Components
//! - `state.rs`: stage, tally and the serialized read-outs
//! - `pushup.rs`: elbow-angle counter with a dead zone
//! - `squat.rs`: knee-angle counter
//! - `situp.rs`: hip-angle counter
//!
//! The exercise set is closed, so [`ExerciseCounter`] is an enum over the
//! three counters rather than a boxed trait object.

pub mod pushup;
pub mod situp;
pub mod squat;
pub mod state;

pub use pushup::PushupCounter;
pub use situp::SitupCounter;
pub use squat::SquatCounter;
pub use state::{calories_for, Diagnostics, RepReport, RepState, Stage};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::RepcountConfig;
use crate::error::EngineError;
use crate::landmarks::{LandmarkResolver, PoseFrame};

/// Supported exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    Pushup,
    Squat,
    Situp,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 3] = [Self::Pushup, Self::Squat, Self::Situp];

    /// Canonical lowercase tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pushup => "pushup",
            Self::Squat => "squat",
            Self::Situp => "situp",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pushup => "Push-up",
            Self::Squat => "Squat",
            Self::Situp => "Sit-up",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Pushup => "Upper body exercise targeting chest, shoulders, and triceps",
            Self::Squat => "Lower body exercise targeting quadriceps, hamstrings, and glutes",
            Self::Situp => "Core exercise targeting abdominal muscles",
        }
    }

    /// Comma-separated list of supported tags, for error messages.
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = EngineError;

    /// Case-insensitive match on the canonical tags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == lowered)
            .ok_or_else(|| EngineError::UnsupportedExerciseType {
                given: s.to_string(),
                supported: Self::supported_list(),
            })
    }
}

/// Uniform capability of every counter.
pub trait RepCounter {
    fn kind(&self) -> ExerciseKind;

    /// Advance with one frame. Missing joints leave count and stage as they were.
    fn step(&mut self, frame: &PoseFrame) -> RepReport;

    fn state(&self) -> RepState;

    /// Zero the count, clear stage and feedback.
    fn reset(&mut self);
}

/// One counter of any supported exercise.
#[derive(Debug, Clone)]
pub enum ExerciseCounter {
    Pushup(PushupCounter),
    Squat(SquatCounter),
    Situp(SitupCounter),
}

impl ExerciseCounter {
    /// Fresh counter for `kind` using default thresholds.
    pub fn new(kind: ExerciseKind) -> Self {
        Self::from_config(kind, &RepcountConfig::default())
    }

    pub fn from_config(kind: ExerciseKind, config: &RepcountConfig) -> Self {
        let resolver = LandmarkResolver::new(config.landmarks.visibility_threshold);
        match kind {
            ExerciseKind::Pushup => {
                Self::Pushup(PushupCounter::with_config(config.pushup.clone(), resolver))
            }
            ExerciseKind::Squat => {
                Self::Squat(SquatCounter::with_config(config.squat.clone(), resolver))
            }
            ExerciseKind::Situp => {
                Self::Situp(SitupCounter::with_config(config.situp.clone(), resolver))
            }
        }
    }

    fn inner(&self) -> &dyn RepCounter {
        match self {
            Self::Pushup(c) => c,
            Self::Squat(c) => c,
            Self::Situp(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn RepCounter {
        match self {
            Self::Pushup(c) => c,
            Self::Squat(c) => c,
            Self::Situp(c) => c,
        }
    }
}

impl RepCounter for ExerciseCounter {
    fn kind(&self) -> ExerciseKind {
        self.inner().kind()
    }

    fn step(&mut self, frame: &PoseFrame) -> RepReport {
        self.inner_mut().step(frame)
    }

    fn state(&self) -> RepState {
        self.inner().state()
    }

    fn reset(&mut self) {
        self.inner_mut().reset()
    }
}
