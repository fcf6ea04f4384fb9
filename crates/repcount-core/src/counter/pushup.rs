//! Push-up Counter
//!
//! Counts on the elbow angle alone, with a hysteresis band between the
//! "arms extended" and "arms bent" thresholds. Thresholds are calibrated
//! for a side-view camera (observed: up 75-85°, down 40-50°).

use super::state::{Diagnostics, RepReport, RepState, Stage, Tally};
use super::RepCounter;
use crate::config::PushupConfig;
use crate::geometry::{joint_angle, round2};
use crate::landmarks::{JointName, LandmarkResolver, PoseFrame};
use crate::ExerciseKind;

/// Elbow angle above which the arms count as extended.
pub const UP_THRESHOLD: f32 = 70.0;
/// Elbow angle below which the arms count as bent.
pub const DOWN_THRESHOLD: f32 = 55.0;
pub const CALORIES_PER_REP: f64 = 0.35;

pub const FEEDBACK_NO_BODY: &str = "Cannot detect body";
pub const FEEDBACK_EXTENDED: &str = "Arms extended - go down";
pub const FEEDBACK_DEPTH: &str = "Good depth!";
pub const FEEDBACK_KEEP_GOING: &str = "Keep going";

const REQUIRED_JOINTS: [JointName; 5] = [
    JointName::LeftShoulder,
    JointName::LeftElbow,
    JointName::LeftWrist,
    JointName::LeftHip,
    JointName::LeftAnkle,
];

#[derive(Debug, Clone)]
pub struct PushupCounter {
    config: PushupConfig,
    resolver: LandmarkResolver,
    tally: Tally,
}

impl PushupCounter {
    pub fn new() -> Self {
        Self::with_config(PushupConfig::default(), LandmarkResolver::default())
    }

    pub fn with_config(config: PushupConfig, resolver: LandmarkResolver) -> Self {
        Self {
            config,
            resolver,
            tally: Tally::default(),
        }
    }

    /// Apply the transition table to one elbow angle and set feedback.
    fn advance(&mut self, elbow_angle: f32) {
        if elbow_angle > self.config.up_threshold {
            self.tally.stage = Some(Stage::Up);
            self.tally.note(FEEDBACK_EXTENDED);
        } else if elbow_angle < self.config.down_threshold {
            if self.tally.stage == Some(Stage::Up) {
                self.tally.record_rep();
                log::debug!(
                    "Push-up rep counted: total={}, elbow_angle={:.1}",
                    self.tally.count,
                    elbow_angle
                );
            }
            self.tally.stage = Some(Stage::Down);
            self.tally.note(FEEDBACK_DEPTH);
        } else {
            self.tally.note(FEEDBACK_KEEP_GOING);
        }
    }
}

impl RepCounter for PushupCounter {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Pushup
    }

    fn step(&mut self, frame: &PoseFrame) -> RepReport {
        self.tally.begin_frame();

        let Some([shoulder, elbow, wrist, hip, ankle]) =
            self.resolver.resolve_all(frame, REQUIRED_JOINTS)
        else {
            self.tally.note(FEEDBACK_NO_BODY);
            return RepReport {
                state: self.state(),
                diagnostics: Diagnostics::Pushup {
                    elbow_angle: 0.0,
                    body_angle: 0.0,
                    posture_ok: false,
                },
            };
        };

        let elbow_angle = joint_angle(shoulder, elbow, wrist);
        // Body line is reported for display; it does not gate counting.
        let body_angle = joint_angle(shoulder, hip, ankle);

        self.advance(elbow_angle);

        RepReport {
            state: self.state(),
            diagnostics: Diagnostics::Pushup {
                elbow_angle: round2(f64::from(elbow_angle)),
                body_angle: round2(f64::from(body_angle)),
                posture_ok: true,
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

impl Default for PushupCounter {
    fn default() -> Self {
        Self::new()
    }
}
