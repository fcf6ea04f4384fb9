//! Joint Angle Geometry
//!
//! Planar angle at a vertex joint, in normalized image coordinates.

/// Angle at vertex `b` formed by the segments `b->a` and `b->c`, in degrees.
///
/// The result is always the smaller of the two measures, so it lies in
/// `[0, 180]` and does not depend on which endpoint is passed first.
///
/// Coincident points yield an undefined (but finite, non-panicking) value:
/// `atan2(0, 0)` is `0`, so a degenerate segment contributes a direction of
/// zero radians.
pub fn joint_angle(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> f32 {
    let radians = (c[1] - b[1]).atan2(c[0] - b[0]) - (a[1] - b[1]).atan2(a[0] - b[0]);
    let angle = radians.to_degrees().abs();

    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}

/// Round to two decimal places, the precision used for reported angles and calories.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
