//! Sit-up Counter
//!
//! - Down position: hip angle > 120° (lying flat)
//! - Up position: hip angle < 80° (sitting up), counted when arriving from down

use super::state::{Diagnostics, RepReport, RepState, Stage, Tally};
use super::RepCounter;
use crate::config::SitupConfig;
use crate::geometry::{joint_angle, round2};
use crate::landmarks::{JointName, LandmarkResolver, PoseFrame};
use crate::ExerciseKind;

pub const DOWN_THRESHOLD: f32 = 120.0;
pub const UP_THRESHOLD: f32 = 80.0;
pub const CALORIES_PER_REP: f64 = 0.25;

pub const FEEDBACK_NO_TORSO: &str = "Cannot detect torso. Please adjust camera.";
pub const FEEDBACK_LEAN_FORWARD: &str = "Lean forward more to complete rep";
pub const FEEDBACK_GOOD_FORM: &str = "Good form!";

const REQUIRED_JOINTS: [JointName; 3] = [
    JointName::LeftShoulder,
    JointName::LeftHip,
    JointName::LeftKnee,
];

#[derive(Debug, Clone)]
pub struct SitupCounter {
    config: SitupConfig,
    resolver: LandmarkResolver,
    tally: Tally,
}

impl SitupCounter {
    pub fn new() -> Self {
        Self::with_config(SitupConfig::default(), LandmarkResolver::default())
    }

    pub fn with_config(config: SitupConfig, resolver: LandmarkResolver) -> Self {
        Self {
            config,
            resolver,
            tally: Tally::default(),
        }
    }

    fn advance(&mut self, hip_angle: f32) {
        if hip_angle > self.config.down_threshold {
            self.tally.stage = Some(Stage::Down);
        }

        if hip_angle < self.config.up_threshold && self.tally.stage == Some(Stage::Down) {
            self.tally.stage = Some(Stage::Up);
            self.tally.record_rep();
            log::debug!(
                "Sit-up rep counted: total={}, hip_angle={:.1}",
                self.tally.count,
                hip_angle
            );
        }

        let in_band = hip_angle > self.config.up_threshold && hip_angle < self.config.down_threshold;
        if in_band && self.tally.stage == Some(Stage::Down) {
            self.tally.note(FEEDBACK_LEAN_FORWARD);
        }

        if self.tally.feedback.is_empty() {
            self.tally.note(FEEDBACK_GOOD_FORM);
        }
    }
}

impl RepCounter for SitupCounter {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Situp
    }

    fn step(&mut self, frame: &PoseFrame) -> RepReport {
        self.tally.begin_frame();

        let Some([shoulder, hip, knee]) = self.resolver.resolve_all(frame, REQUIRED_JOINTS) else {
            self.tally.note(FEEDBACK_NO_TORSO);
            return RepReport {
                state: self.state(),
                diagnostics: Diagnostics::Situp { hip_angle: 0.0 },
            };
        };

        let hip_angle = joint_angle(shoulder, hip, knee);
        self.advance(hip_angle);

        RepReport {
            state: self.state(),
            diagnostics: Diagnostics::Situp {
                hip_angle: round2(f64::from(hip_angle)),
            },
        }
    }

    fn state(&self) -> RepState {
        self.tally.snapshot(self.config.calories_per_rep)
    }

    fn reset(&mut self) {
        self.tally.reset();
    }
}

impl Default for SitupCounter {
    fn default() -> Self {
        Self::new()
    }
}
