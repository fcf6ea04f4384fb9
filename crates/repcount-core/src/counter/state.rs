//! Counter state shared by every exercise
//!
//! Two kinds of fields live side by side:
//! - `count` / `stage` persist across frames and change only through the
//!   per-exercise transition rules (or a reset)
//! - `feedback` is rebuilt from scratch on every frame
//!
//! Calories are never stored; they are derived from `count` on each read.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::round2;

/// Phase of the current repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Up,
    Down,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Up => "up",
            Stage::Down => "down",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable tally owned by a single counter.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    pub(in crate::counter) count: u32,
    pub(in crate::counter) stage: Option<Stage>,
    pub(in crate::counter) feedback: Vec<String>,
}

impl Tally {
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn feedback(&self) -> &[String] {
        &self.feedback
    }

    /// Start a new frame: feedback from the previous frame is dropped.
    pub(in crate::counter) fn begin_frame(&mut self) {
        self.feedback.clear();
    }

    pub(in crate::counter) fn note(&mut self, message: &str) {
        self.feedback.push(message.to_string());
    }

    pub(in crate::counter) fn record_rep(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Read-out with calories derived from the current count.
    pub(in crate::counter) fn snapshot(&self, calories_per_rep: f64) -> RepState {
        RepState {
            count: self.count,
            stage: self.stage,
            form_feedback: self.feedback.clone(),
            calories_burned: calories_for(self.count, calories_per_rep),
        }
    }

    pub(in crate::counter) fn reset(&mut self) {
        self.count = 0;
        self.stage = None;
        self.feedback.clear();
    }
}

/// `round(count * calories_per_rep, 2)`
pub fn calories_for(count: u32, calories_per_rep: f64) -> f64 {
    round2(f64::from(count) * calories_per_rep)
}

/// Externally visible counter state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepState {
    pub count: u32,
    pub stage: Option<Stage>,
    pub form_feedback: Vec<String>,
    pub calories_burned: f64,
}

/// Per-exercise angles observed on the last stepped frame.
///
/// Fields are zero (and `posture_ok` false) when the required joints were
/// unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Diagnostics {
    Pushup {
        elbow_angle: f64,
        body_angle: f64,
        posture_ok: bool,
    },
    Squat {
        knee_angle: f64,
    },
    Situp {
        hip_angle: f64,
    },
}

/// Result of stepping a counter with one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepReport {
    #[serde(flatten)]
    pub state: RepState,
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
}
