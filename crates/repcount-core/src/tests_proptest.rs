use proptest::prelude::*;

// Property-based checks for angle geometry and counter invariants

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{frame_with_angle, pushup_frame};
    use crate::counter::{ExerciseCounter, ExerciseKind, RepCounter};
    use crate::geometry::joint_angle;
    use crate::landmarks::{JointName, PoseFrame};
    use crate::session::TrackedSession;

    fn point() -> impl Strategy<Value = [f32; 2]> {
        (0.0f32..1.0, 0.0f32..1.0).prop_map(|(x, y)| [x, y])
    }

    fn distinct(a: [f32; 2], b: [f32; 2]) -> bool {
        (a[0] - b[0]).abs() > 1e-3 || (a[1] - b[1]).abs() > 1e-3
    }

    // =========================================================================
    // Angle range and endpoint symmetry
    // =========================================================================
    proptest! {
        #[test]
        fn test_angle_in_range_and_symmetric(a in point(), b in point(), c in point()) {
            prop_assume!(distinct(a, b) && distinct(c, b));

            let forward = joint_angle(a, b, c);
            let backward = joint_angle(c, b, a);
            prop_assert!((0.0..=180.0).contains(&forward), "angle {} out of range", forward);
            prop_assert!((forward - backward).abs() < 1e-3);
        }
    }

    // =========================================================================
    // Count never decreases without a reset
    // =========================================================================
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_count_monotonic(
            kind_idx in 0usize..3,
            angles in prop::collection::vec(prop::option::of(0.0f32..180.0), 1..60),
        ) {
            let kind = ExerciseKind::ALL[kind_idx];
            let mut counter = ExerciseCounter::new(kind);
            let (first, vertex, last) = match kind {
                ExerciseKind::Pushup => (JointName::LeftShoulder, JointName::LeftElbow, JointName::LeftWrist),
                ExerciseKind::Squat => (JointName::LeftHip, JointName::LeftKnee, JointName::LeftAnkle),
                ExerciseKind::Situp => (JointName::LeftShoulder, JointName::LeftHip, JointName::LeftKnee),
            };
            let extras = [JointName::LeftHip, JointName::LeftAnkle, JointName::LeftShoulder];

            let mut previous = 0;
            for angle in angles {
                let frame = match angle {
                    Some(deg) => {
                        let extras: Vec<JointName> = extras
                            .iter()
                            .copied()
                            .filter(|j| *j != first && *j != vertex && *j != last)
                            .collect();
                        frame_with_angle(first, vertex, last, deg, &extras)
                    }
                    None => PoseFrame::new(),
                };
                let before = counter.state();
                let report = counter.step(&frame);
                prop_assert!(report.state.count >= previous);
                if angle.is_none() {
                    prop_assert_eq!(report.state.count, before.count);
                    prop_assert_eq!(report.state.stage, before.stage);
                }
                previous = report.state.count;
            }
        }
    }

    // =========================================================================
    // Late frames never mutate the counter
    // =========================================================================
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_out_of_order_frames_rejected(
            ts1 in 1000i64..1_000_000_000i64,
            delta in -999i64..-1i64,
        ) {
            let mut session = TrackedSession::new(ExerciseCounter::new(ExerciseKind::Pushup));
            session.apply(Some(&pushup_frame(80.0)), Some(ts1));
            let before = session.state();

            let report = session.apply(Some(&pushup_frame(50.0)), Some(ts1 + delta));

            prop_assert!(report.frame_rejected);
            prop_assert_eq!(report.state.count, before.count);
            prop_assert_eq!(report.state.stage, before.stage);
            prop_assert_eq!(session.last_frame_ts_us(), Some(ts1));
        }
    }
}
