//! Synthetic pose frames shared by unit tests, integration tests and benches.
//!
//! Integration tests and benches include this file by path, so it only names
//! the landmark types through `super::landmarks`.

use super::landmarks::{JointName, JointPoint, PoseFrame};

/// Frame where the angle at `vertex` between `first` and `last` is
/// `degrees`. `extras` are placed at a fixed visible position.
pub(crate) fn frame_with_angle(
    first: JointName,
    vertex: JointName,
    last: JointName,
    degrees: f32,
    extras: &[JointName],
) -> PoseFrame {
    let (cx, cy) = (0.5, 0.5);
    let radius = 0.2;
    let theta = degrees.to_radians();

    let mut frame = PoseFrame::new()
        .with(vertex, JointPoint::new(cx, cy, 1.0))
        .with(first, JointPoint::new(cx + radius, cy, 1.0))
        .with(
            last,
            JointPoint::new(cx + radius * theta.cos(), cy + radius * theta.sin(), 1.0),
        );
    for (i, joint) in extras.iter().enumerate() {
        frame.insert(*joint, JointPoint::new(0.2 + 0.1 * i as f32, 0.8, 1.0));
    }
    frame
}

/// Frame where every landmark is present but below any sane visibility threshold.
pub(crate) fn hidden_frame() -> PoseFrame {
    let mut frame = PoseFrame::new();
    for joint in JointName::ALL {
        frame.insert(joint, JointPoint::new(0.5, 0.5, 0.05));
    }
    frame
}

pub(crate) fn pushup_frame(elbow_angle: f32) -> PoseFrame {
    frame_with_angle(
        JointName::LeftShoulder,
        JointName::LeftElbow,
        JointName::LeftWrist,
        elbow_angle,
        &[JointName::LeftHip, JointName::LeftAnkle],
    )
}

pub(crate) fn squat_frame(knee_angle: f32) -> PoseFrame {
    frame_with_angle(
        JointName::LeftHip,
        JointName::LeftKnee,
        JointName::LeftAnkle,
        knee_angle,
        &[JointName::LeftShoulder],
    )
}

pub(crate) fn situp_frame(hip_angle: f32) -> PoseFrame {
    frame_with_angle(
        JointName::LeftShoulder,
        JointName::LeftHip,
        JointName::LeftKnee,
        hip_angle,
        &[],
    )
}
