#![allow(dead_code)]

use repcount_core::{landmarks, FrameRequest, PoseFrame};

#[path = "../../src/fixtures.rs"]
mod fixtures;

pub(crate) use fixtures::{frame_with_angle, hidden_frame, pushup_frame, situp_frame, squat_frame};

pub fn request(session: &str, exercise: &str, frame: PoseFrame) -> FrameRequest {
    FrameRequest::new(session, exercise).with_landmarks(frame)
}
