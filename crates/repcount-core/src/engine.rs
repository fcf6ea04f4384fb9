//! Rep Engine: the validating boundary
//!
//! Owns one [`SessionRegistry`] and the configuration. Exercise tags are
//! parsed here, so nothing below this layer ever sees an unsupported tag.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::RepcountConfig;
use crate::counter::{ExerciseKind, RepState};
use crate::error::EngineError;
use crate::landmarks::PoseFrame;
use crate::registry::SessionRegistry;
use crate::session::FrameReport;

pub const DEFAULT_SESSION_ID: &str = "default";
pub const DEFAULT_EXERCISE: &str = "pushup";

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

fn default_exercise() -> String {
    DEFAULT_EXERCISE.to_string()
}

/// One frame to count against a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRequest {
    #[serde(default = "default_session_id")]
    pub session_id: String,
    #[serde(default = "default_exercise")]
    pub exercise_type: String,
    /// `None` when the pose model found nobody
    #[serde(default)]
    pub landmarks: Option<PoseFrame>,
    /// Capture time in microseconds
    #[serde(default)]
    pub timestamp_us: Option<i64>,
}

impl FrameRequest {
    pub fn new(session_id: impl Into<String>, exercise_type: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            exercise_type: exercise_type.into(),
            landmarks: None,
            timestamp_us: None,
        }
    }

    pub fn with_landmarks(mut self, frame: PoseFrame) -> Self {
        self.landmarks = Some(frame);
        self
    }

    pub fn with_timestamp(mut self, timestamp_us: i64) -> Self {
        self.timestamp_us = Some(timestamp_us);
        self
    }
}

impl Default for FrameRequest {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_ID, DEFAULT_EXERCISE)
    }
}

/// Catalog entry for a supported exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseInfo {
    pub id: ExerciseKind,
    pub name: &'static str,
    pub calories_per_rep: f64,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct RepEngine {
    registry: SessionRegistry,
}

impl RepEngine {
    /// Engine with built-in defaults.
    pub fn new() -> Self {
        Self {
            registry: SessionRegistry::default(),
        }
    }

    /// Engine with a validated configuration.
    pub fn with_config(config: RepcountConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            registry: SessionRegistry::new(config),
        })
    }

    pub fn config(&self) -> &RepcountConfig {
        self.registry.config()
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Count one frame. Only the addressed session is locked while stepping,
    /// and the frame always lands on the session the registry holds.
    pub fn process(&self, request: &FrameRequest) -> Result<FrameReport, EngineError> {
        let kind: ExerciseKind = request.exercise_type.parse()?;
        Ok(self.registry.with_session(&request.session_id, kind, |session| {
            session.apply(request.landmarks.as_ref(), request.timestamp_us)
        }))
    }

    /// Replace the session's counter with a fresh one and return its state.
    pub fn reset(&self, session_id: &str, exercise_type: &str) -> Result<RepState, EngineError> {
        let kind: ExerciseKind = exercise_type.parse()?;
        let session = self.registry.reset(session_id, kind);
        let state = session.lock().state();
        Ok(state)
    }

    /// Prefix cleanup. An empty prefix would match every session and is refused.
    pub fn cleanup(&self, session_prefix: &str) -> Result<usize, EngineError> {
        if session_prefix.is_empty() {
            return Err(EngineError::MissingSessionId);
        }
        Ok(self.registry.cleanup(session_prefix))
    }

    /// Remove all exercises of exactly `session_id`.
    pub fn remove_session(&self, session_id: &str) -> Result<usize, EngineError> {
        if session_id.is_empty() {
            return Err(EngineError::MissingSessionId);
        }
        Ok(self.registry.remove_session(session_id))
    }

    pub fn snapshot(&self) -> BTreeMap<String, RepState> {
        self.registry.snapshot_all()
    }

    /// Supported exercises with the configured calorie weights.
    pub fn exercises(&self) -> Vec<ExerciseInfo> {
        let config = self.config();
        ExerciseKind::ALL
            .iter()
            .map(|&kind| ExerciseInfo {
                id: kind,
                name: kind.display_name(),
                calories_per_rep: match kind {
                    ExerciseKind::Pushup => config.pushup.calories_per_rep,
                    ExerciseKind::Squat => config.squat.calories_per_rep,
                    ExerciseKind::Situp => config.situp.calories_per_rep,
                },
                description: kind.description(),
            })
            .collect()
    }

    pub fn evict_idle(&self) -> usize {
        self.registry.evict_idle()
    }
}

impl Default for RepEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::squat_frame;
    use crate::session::FEEDBACK_NO_PERSON;

    fn squat_request(session: &str, knee_angle: f32) -> FrameRequest {
        FrameRequest::new(session, "squat").with_landmarks(squat_frame(knee_angle))
    }

    #[test]
    fn test_process_counts_squats() {
        let engine = RepEngine::new();
        let mut report = None;
        for angle in [170.0, 90.0, 170.0, 90.0] {
            report = Some(engine.process(&squat_request("u1", angle)).unwrap());
        }
        let report = report.unwrap();
        assert_eq!(report.state.count, 2);
        assert!(report.landmarks_detected);
        assert_eq!(report.state.calories_burned, 0.64);
    }

    #[test]
    fn test_exercise_tag_case_insensitive() {
        let engine = RepEngine::new();
        engine.process(&FrameRequest::new("u1", "SQUAT")).unwrap();
        assert!(engine.snapshot().contains_key("u1_squat"));
    }

    #[test]
    fn test_unsupported_exercise_never_reaches_registry() {
        let engine = RepEngine::new();
        let err = engine.process(&FrameRequest::new("u1", "burpee")).unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnsupportedExerciseType { ref given, .. } if given == "burpee"
        ));
        assert!(engine.registry().is_empty());
        assert!(engine.reset("u1", "burpee").is_err());
    }

    #[test]
    fn test_no_landmarks_reports_stored_state() {
        let engine = RepEngine::new();
        engine.process(&squat_request("u1", 170.0)).unwrap();
        engine.process(&squat_request("u1", 90.0)).unwrap();

        let report = engine.process(&FrameRequest::new("u1", "squat")).unwrap();
        assert_eq!(report.state.count, 1);
        assert!(!report.landmarks_detected);
        assert_eq!(report.state.form_feedback, vec![FEEDBACK_NO_PERSON.to_string()]);
    }

    #[test]
    fn test_reset_zeroes_state() {
        let engine = RepEngine::new();
        engine.process(&squat_request("u1", 170.0)).unwrap();
        engine.process(&squat_request("u1", 90.0)).unwrap();

        let state = engine.reset("u1", "squat").unwrap();
        assert_eq!(state.count, 0);
        assert_eq!(state.stage, None);
        assert_eq!(engine.snapshot()["u1_squat"].count, 0);
    }

    #[test]
    fn test_cleanup_requires_prefix() {
        let engine = RepEngine::new();
        engine.process(&FrameRequest::new("u1", "pushup")).unwrap();
        assert!(matches!(engine.cleanup(""), Err(EngineError::MissingSessionId)));
        assert!(matches!(
            engine.remove_session(""),
            Err(EngineError::MissingSessionId)
        ));
        assert_eq!(engine.cleanup("u1").unwrap(), 1);
    }

    #[test]
    fn test_exercise_catalog_uses_config() {
        let mut config = RepcountConfig::default();
        config.squat.calories_per_rep = 0.5;
        let engine = RepEngine::with_config(config).unwrap();

        let catalog = engine.exercises();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog[0].name, "Push-up");
        assert_eq!(catalog[1].calories_per_rep, 0.5);
        assert_eq!(catalog[2].id, ExerciseKind::Situp);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RepcountConfig::default();
        config.landmarks.visibility_threshold = -1.0;
        assert!(matches!(
            RepEngine::with_config(config),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_request_defaults_from_json() {
        let request: FrameRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.session_id, "default");
        assert_eq!(request.exercise_type, "pushup");
        assert!(request.landmarks.is_none());

        let request: FrameRequest = serde_json::from_str(
            r#"{"session_id":"u9","exercise_type":"situp","landmarks":null,"timestamp_us":42}"#,
        )
        .unwrap();
        assert_eq!(request.timestamp_us, Some(42));
        assert!(request.landmarks.is_none());
    }
}
