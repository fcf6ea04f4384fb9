//! Body Landmarks and Side-Fallback Resolution
//!
//! The pose collaborator reports 33 body landmarks per frame, each with a
//! normalized position and a visibility confidence. Counters never read the
//! frame directly: they ask a [`LandmarkResolver`] for a usable point, which
//! falls back to the mirrored joint when the requested side is occluded.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Number of body landmarks in one pose frame.
pub const LANDMARK_COUNT: usize = 33;

/// Default minimum visibility for a landmark to be trusted.
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.5;

/// Named body landmark, numbered in the pose model's output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JointName {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl JointName {
    /// All landmarks in index order.
    pub const ALL: [JointName; LANDMARK_COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    /// Index in the pose model's landmark list.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    /// Wire tag, e.g. `LEFT_SHOULDER`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nose => "NOSE",
            Self::LeftEyeInner => "LEFT_EYE_INNER",
            Self::LeftEye => "LEFT_EYE",
            Self::LeftEyeOuter => "LEFT_EYE_OUTER",
            Self::RightEyeInner => "RIGHT_EYE_INNER",
            Self::RightEye => "RIGHT_EYE",
            Self::RightEyeOuter => "RIGHT_EYE_OUTER",
            Self::LeftEar => "LEFT_EAR",
            Self::RightEar => "RIGHT_EAR",
            Self::MouthLeft => "MOUTH_LEFT",
            Self::MouthRight => "MOUTH_RIGHT",
            Self::LeftShoulder => "LEFT_SHOULDER",
            Self::RightShoulder => "RIGHT_SHOULDER",
            Self::LeftElbow => "LEFT_ELBOW",
            Self::RightElbow => "RIGHT_ELBOW",
            Self::LeftWrist => "LEFT_WRIST",
            Self::RightWrist => "RIGHT_WRIST",
            Self::LeftPinky => "LEFT_PINKY",
            Self::RightPinky => "RIGHT_PINKY",
            Self::LeftIndex => "LEFT_INDEX",
            Self::RightIndex => "RIGHT_INDEX",
            Self::LeftThumb => "LEFT_THUMB",
            Self::RightThumb => "RIGHT_THUMB",
            Self::LeftHip => "LEFT_HIP",
            Self::RightHip => "RIGHT_HIP",
            Self::LeftKnee => "LEFT_KNEE",
            Self::RightKnee => "RIGHT_KNEE",
            Self::LeftAnkle => "LEFT_ANKLE",
            Self::RightAnkle => "RIGHT_ANKLE",
            Self::LeftHeel => "LEFT_HEEL",
            Self::RightHeel => "RIGHT_HEEL",
            Self::LeftFootIndex => "LEFT_FOOT_INDEX",
            Self::RightFootIndex => "RIGHT_FOOT_INDEX",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|joint| joint.as_str() == tag)
    }

    /// Same joint on the other side of the body.
    ///
    /// Only `LEFT_*` / `RIGHT_*` landmarks have a mirror. The nose and the
    /// mouth corners (`MOUTH_LEFT`, `MOUTH_RIGHT`) resolve on their own.
    pub fn mirror(self) -> Option<Self> {
        let tag = self.as_str();
        let mirrored = if let Some(rest) = tag.strip_prefix("LEFT_") {
            format!("RIGHT_{}", rest)
        } else if let Some(rest) = tag.strip_prefix("RIGHT_") {
            format!("LEFT_{}", rest)
        } else {
            return None;
        };
        Self::from_tag(&mirrored)
    }
}

impl fmt::Display for JointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One landmark observation: normalized `[0,1]` coordinates plus confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointPoint {
    pub x: f32,
    pub y: f32,
    pub visibility: f32,
}

impl JointPoint {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }

    #[inline]
    pub fn position(&self) -> [f32; 2] {
        [self.x, self.y]
    }

    /// All fields are finite numbers.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.visibility.is_finite()
    }
}

/// Landmarks observed in a single frame. Joints the model did not report are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PoseFrameRepr", into = "BTreeMap<JointName, JointPoint>")]
pub struct PoseFrame {
    points: [Option<JointPoint>; LANDMARK_COUNT],
}

impl PoseFrame {
    pub fn new() -> Self {
        Self {
            points: [None; LANDMARK_COUNT],
        }
    }

    /// Build from the model's index-ordered list. Entries past the last
    /// known landmark are ignored.
    pub fn from_indexed(points: &[JointPoint]) -> Self {
        let mut frame = Self::new();
        for (slot, point) in frame.points.iter_mut().zip(points) {
            *slot = Some(*point);
        }
        frame
    }

    pub fn with(mut self, joint: JointName, point: JointPoint) -> Self {
        self.insert(joint, point);
        self
    }

    pub fn insert(&mut self, joint: JointName, point: JointPoint) {
        self.points[joint.index()] = Some(point);
    }

    pub fn get(&self, joint: JointName) -> Option<&JointPoint> {
        self.points[joint.index()].as_ref()
    }

    /// Number of landmarks present.
    pub fn len(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }

    pub fn iter(&self) -> impl Iterator<Item = (JointName, &JointPoint)> {
        JointName::ALL
            .into_iter()
            .zip(self.points.iter())
            .filter_map(|(joint, point)| point.as_ref().map(|p| (joint, p)))
    }
}

/// Accepted wire shapes for a frame: a name-keyed map or an index-ordered list.
#[derive(Deserialize)]
#[serde(untagged)]
enum PoseFrameRepr {
    Named(HashMap<String, JointPoint>),
    Indexed(Vec<JointPoint>),
}

impl From<PoseFrameRepr> for PoseFrame {
    fn from(repr: PoseFrameRepr) -> Self {
        match repr {
            PoseFrameRepr::Indexed(points) => PoseFrame::from_indexed(&points),
            PoseFrameRepr::Named(named) => {
                let mut frame = PoseFrame::new();
                for (tag, point) in named {
                    match JointName::from_tag(&tag) {
                        Some(joint) => frame.insert(joint, point),
                        None => log::debug!("Ignoring unknown landmark '{}'", tag),
                    }
                }
                frame
            }
        }
    }
}

impl Default for PoseFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl From<PoseFrame> for BTreeMap<JointName, JointPoint> {
    fn from(frame: PoseFrame) -> Self {
        frame.iter().map(|(joint, point)| (joint, *point)).collect()
    }
}

/// Resolves named joints to usable 2D points with left/right fallback.
#[derive(Debug, Clone, Copy)]
pub struct LandmarkResolver {
    visibility_threshold: f32,
}

impl LandmarkResolver {
    pub fn new(visibility_threshold: f32) -> Self {
        Self {
            visibility_threshold,
        }
    }

    pub fn visibility_threshold(&self) -> f32 {
        self.visibility_threshold
    }

    /// Point for `joint`, or for its mirror when `joint` is missing or below
    /// the visibility threshold. `None` when neither side is usable.
    ///
    /// Treating both sides as interchangeable assumes approximate body
    /// symmetry, which holds well enough for single-joint angles.
    pub fn resolve(&self, frame: &PoseFrame, joint: JointName) -> Option<[f32; 2]> {
        self.lookup(frame, joint)
            .or_else(|| joint.mirror().and_then(|alt| self.lookup(frame, alt)))
    }

    /// Resolve every joint, or nothing if any one is unavailable.
    pub fn resolve_all<const N: usize>(
        &self,
        frame: &PoseFrame,
        joints: [JointName; N],
    ) -> Option<[[f32; 2]; N]> {
        let mut resolved = [[0.0; 2]; N];
        for (slot, joint) in resolved.iter_mut().zip(joints) {
            *slot = self.resolve(frame, joint)?;
        }
        Some(resolved)
    }

    fn lookup(&self, frame: &PoseFrame, joint: JointName) -> Option<[f32; 2]> {
        frame
            .get(joint)
            .filter(|p| p.is_well_formed() && p.visibility >= self.visibility_threshold)
            .map(JointPoint::position)
    }
}

impl Default for LandmarkResolver {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_THRESHOLD)
    }
}
