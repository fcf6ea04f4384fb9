//! Squat Counter
//!
//! - Up position: knee angle > 160°
//! - Down position: knee angle < 100°, counted when arriving from up
//!
//! Both checks run on every frame, "up" first. There is no feedback-bearing
//! dead zone: angles between the thresholds leave the stage untouched.

use super::state::{Diagnostics, RepReport, RepState, Stage, Tally};
use super::RepCounter;
use crate::config::SquatConfig;
use crate::geometry::{joint_angle, round2};
use crate::landmarks::{JointName, LandmarkResolver, PoseFrame};
use crate::ExerciseKind;

pub const UP_THRESHOLD: f32 = 160.0;
pub const DOWN_THRESHOLD: f32 = 100.0;
pub const CALORIES_PER_REP: f64 = 0.32;

pub const FEEDBACK_NO_LEGS: &str = "Cannot detect legs. Please adjust camera.";
pub const FEEDBACK_GOOD_FORM: &str = "Good form!";

const REQUIRED_JOINTS: [JointName; 4] = [
    JointName::LeftHip,
    JointName::LeftKnee,
    JointName::LeftAnkle,
    JointName::LeftShoulder,
];

#[derive(Debug, Clone)]
pub struct SquatCounter {
    config: SquatConfig,
    resolver: LandmarkResolver,
    tally: Tally,
}

impl SquatCounter {
    pub fn new() -> Self {
        Self::with_config(SquatConfig::default(), LandmarkResolver::default())
    }

    pub fn with_config(config: SquatConfig, resolver: LandmarkResolver) -> Self {
        Self {
            config,
            resolver,
            tally: Tally::default(),
        }
    }

    fn advance(&mut self, knee_angle: f32) {
        if knee_angle > self.config.up_threshold {
            self.tally.stage = Some(Stage::Up);
        }

        if knee_angle < self.config.down_threshold && self.tally.stage == Some(Stage::Up) {
            self.tally.stage = Some(Stage::Down);
            self.tally.record_rep();
            log::debug!(
                "Squat rep counted: total={}, knee_angle={:.1}",
                self.tally.count,
                knee_angle
            );
        }

        if self.tally.feedback.is_empty() {
            self.tally.note(FEEDBACK_GOOD_FORM);
        }
    }
}

impl RepCounter for SquatCounter {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Squat
    }

    fn step(&mut self, frame: &PoseFrame) -> RepReport {
        self.tally.begin_frame();

        // Shoulder is required for a full-body view even though only the
        // knee angle drives counting.
        let Some([hip, knee, ankle, _shoulder]) =
            self.resolver.resolve_all(frame, REQUIRED_JOINTS)
        else {
            self.tally.note(FEEDBACK_NO_LEGS);
            return RepReport {
                state: self.state(),
                diagnostics: Diagnostics::Squat { knee_angle: 0.0 },
            };
        };

        let knee_angle = joint_angle(hip, knee, ankle);
        self.advance(knee_angle);

        RepReport {
            state: self.state(),
            diagnostics: Diagnostics::Squat {
                knee_angle: round2(f64::from(knee_angle)),
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

impl Default for SquatCounter {
    fn default() -> Self {
        Self::new()
    }
}
