//! Tracked Session
//!
//! One counter plus the bookkeeping the boundary needs around it: whether a
//! person was in frame, and the capture time of the last applied frame so
//! that late frames cannot rewind the hysteresis state.

use serde::Serialize;

use crate::counter::{Diagnostics, ExerciseCounter, ExerciseKind, RepCounter, RepState};
use crate::landmarks::PoseFrame;

pub const FEEDBACK_NO_PERSON: &str = "No person detected. Please step into frame.";
pub const FEEDBACK_OUT_OF_ORDER: &str = "Out-of-order frame ignored";

/// Per-frame response handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    #[serde(flatten)]
    pub state: RepState,
    /// Absent when the counter was not stepped
    #[serde(flatten)]
    pub diagnostics: Option<Diagnostics>,
    pub landmarks_detected: bool,
    pub frame_rejected: bool,
}

#[derive(Debug, Clone)]
pub struct TrackedSession {
    counter: ExerciseCounter,
    last_frame_ts_us: Option<i64>,
    frames_applied: u64,
}

impl TrackedSession {
    pub fn new(counter: ExerciseCounter) -> Self {
        Self {
            counter,
            last_frame_ts_us: None,
            frames_applied: 0,
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        self.counter.kind()
    }

    pub fn state(&self) -> RepState {
        self.counter.state()
    }

    /// Capture time of the last frame that stepped the counter.
    pub fn last_frame_ts_us(&self) -> Option<i64> {
        self.last_frame_ts_us
    }

    pub fn frames_applied(&self) -> u64 {
        self.frames_applied
    }

    /// Apply one observation.
    ///
    /// `None` or an empty frame means no person: the counter is not stepped
    /// and the stored count/stage are reported unchanged. A timestamp older
    /// than the last applied one is rejected without touching the counter;
    /// frames without a timestamp are applied in arrival order.
    pub fn apply(&mut self, frame: Option<&PoseFrame>, timestamp_us: Option<i64>) -> FrameReport {
        if let (Some(ts), Some(last)) = (timestamp_us, self.last_frame_ts_us) {
            if ts < last {
                log::debug!(
                    "Rejected out-of-order {} frame: ts={} < last={}",
                    self.kind(),
                    ts,
                    last
                );
                return self.held_report(FEEDBACK_OUT_OF_ORDER, frame.is_some(), true);
            }
        }

        let Some(frame) = frame.filter(|f| !f.is_empty()) else {
            return self.held_report(FEEDBACK_NO_PERSON, false, false);
        };

        let report = self.counter.step(frame);
        self.frames_applied += 1;
        if timestamp_us.is_some() {
            self.last_frame_ts_us = timestamp_us;
        }

        FrameReport {
            state: report.state,
            diagnostics: Some(report.diagnostics),
            landmarks_detected: true,
            frame_rejected: false,
        }
    }

    /// Zero the counter and forget frame history.
    pub fn reset(&mut self) {
        self.counter.reset();
        self.last_frame_ts_us = None;
        self.frames_applied = 0;
    }

    fn held_report(&self, message: &str, landmarks_detected: bool, frame_rejected: bool) -> FrameReport {
        let mut state = self.counter.state();
        state.form_feedback = vec![message.to_string()];
        FrameReport {
            state,
            diagnostics: None,
            landmarks_detected,
            frame_rejected,
        }
    }
}
