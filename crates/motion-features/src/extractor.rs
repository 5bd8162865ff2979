//! Feature Extractor (C2): maps one landmark frame to a normalized
//! translation/scale-invariant feature vector, per §4.2.

use motion_models::TestModel;

use crate::error::{ExtractError, ExtractResult};
use crate::landmarks::FrameLandmarks;

/// Small constant to avoid division by zero when a scale reference
/// collapses to two coincident points.
const EPS: f32 = 1e-6;

/// Fixed finger-tapping landmark index set, §4.2. Clinically unverified —
/// see DESIGN.md Open Question resolution.
const FINGER_LANDMARK_INDICES: [usize; 4] = [3, 4, 7, 8];

/// The external, pluggable collaborator that turns an image into landmarks.
/// Implementations of this trait live outside this crate (e.g. a MediaPipe
/// or ONNX-backed detector); this crate only owns the normalization math
/// downstream of it.
pub trait LandmarkSource: Send + Sync {
    /// Run detection on a decoded image, returning whatever landmarks were
    /// found (possibly none).
    fn detect(&self, image: &[u8]) -> FrameLandmarks;
}

/// A `LandmarkSource` that never detects anything. Useful as a test double
/// and as the default when no real detector is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLandmarkSource;

impl LandmarkSource for NullLandmarkSource {
    fn detect(&self, _image: &[u8]) -> FrameLandmarks {
        FrameLandmarks::default()
    }
}

/// Extract a normalized feature vector for `model` from one frame's
/// landmarks, or report that the frame should be dropped.
pub fn extract(
    model: TestModel,
    landmarks: &FrameLandmarks,
    use_z: bool,
) -> ExtractResult<Vec<f32>> {
    match model {
        TestModel::Hands => hands_features(landmarks).ok_or(ExtractError::Drop("hands")),
        TestModel::Pose => {
            pose_features(landmarks, use_z).ok_or(ExtractError::Drop("pose"))
        }
        TestModel::Finger => finger_features(landmarks).ok_or(ExtractError::Drop("finger")),
    }
}

/// hands: origin = wrist (landmark 0); scale = ‖landmark9 − landmark0‖ + ε;
/// output = flatten((pts − origin) / scale) over (x, y) → 42-dim.
fn hands_features(landmarks: &FrameLandmarks) -> Option<Vec<f32>> {
    let hand = landmarks.hands.first()?;
    if hand.points.len() < 21 {
        return None;
    }

    let origin = hand.points[0];
    let scale = dist2(hand.points[9], origin) + EPS;

    let mut out = Vec::with_capacity(42);
    for p in hand.points.iter().take(21) {
        out.push((p.x - origin.x) / scale);
        out.push((p.y - origin.y) / scale);
    }
    Some(out)
}

/// pose: origin = midpoint(landmark23, landmark24); scale =
/// ‖landmark11 − landmark12‖ + ε; output flattened over (x, y[, z]).
fn pose_features(landmarks: &FrameLandmarks, use_z: bool) -> Option<Vec<f32>> {
    let pose = landmarks.pose.as_ref()?;
    if pose.points.len() < 33 {
        return None;
    }

    let mid_hip_x = (pose.points[23].x + pose.points[24].x) / 2.0;
    let mid_hip_y = (pose.points[23].y + pose.points[24].y) / 2.0;
    let mid_hip_z = (pose.points[23].z + pose.points[24].z) / 2.0;

    let shoulder_w = dist2(pose.points[11], pose.points[12]) + EPS;

    let dim = if use_z { 99 } else { 66 };
    let mut out = Vec::with_capacity(dim);
    for p in pose.points.iter().take(33) {
        out.push((p.x - mid_hip_x) / shoulder_w);
        out.push((p.y - mid_hip_y) / shoulder_w);
        if use_z {
            out.push((p.z - mid_hip_z) / shoulder_w);
        }
    }
    Some(out)
}

/// finger: compute the 21-point hands normalization, then keep only the
/// (x, y) pair for each index in `FINGER_LANDMARK_INDICES` → 8-dim.
fn finger_features(landmarks: &FrameLandmarks) -> Option<Vec<f32>> {
    let hand = landmarks.hands.first()?;
    if hand.points.len() < 21 {
        return None;
    }

    let origin = hand.points[0];
    let scale = dist2(hand.points[9], origin) + EPS;

    let mut out = Vec::with_capacity(FINGER_LANDMARK_INDICES.len() * 2);
    for &idx in &FINGER_LANDMARK_INDICES {
        let p = hand.points[idx];
        out.push((p.x - origin.x) / scale);
        out.push((p.y - origin.y) / scale);
    }
    Some(out)
}

/// Euclidean distance between the (x, y) projection of two points — the
/// scale references in §4.2 are always 2-D norms even for 3-D pose input.
fn dist2(a: crate::landmarks::Point3, b: crate::landmarks::Point3) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{HandLandmarks, Point3, PoseLandmarks};

    fn hand_with(points: Vec<Point3>) -> FrameLandmarks {
        FrameLandmarks {
            hands: vec![HandLandmarks {
                points,
                handedness: None,
            }],
            pose: None,
        }
    }

    fn flat_pose(n: usize) -> Vec<Point3> {
        (0..n)
            .map(|i| Point3::new(i as f32 * 0.01, i as f32 * 0.02, 0.0))
            .collect()
    }

    #[test]
    fn hands_drop_when_fewer_than_21_points() {
        let lm = hand_with(vec![Point3::new(0.0, 0.0, 0.0); 5]);
        assert_eq!(
            extract(TestModel::Hands, &lm, false),
            Err(ExtractError::Drop("hands"))
        );
    }

    #[test]
    fn hands_drop_when_no_hand_detected() {
        let lm = FrameLandmarks::default();
        assert_eq!(
            extract(TestModel::Hands, &lm, false),
            Err(ExtractError::Drop("hands"))
        );
    }

    #[test]
    fn hands_features_are_translation_invariant() {
        let base: Vec<Point3> = (0..21)
            .map(|i| Point3::new(i as f32 * 0.1, i as f32 * 0.05, 0.0))
            .collect();
        let shifted: Vec<Point3> = base.iter().map(|p| Point3::new(p.x + 5.0, p.y + 7.0, p.z)).collect();

        let a = extract(TestModel::Hands, &hand_with(base), false).unwrap();
        let b = extract(TestModel::Hands, &hand_with(shifted), false).unwrap();

        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-4, "{} vs {}", x, y);
        }
    }

    #[test]
    fn hands_output_is_42_dim() {
        let base: Vec<Point3> = (0..21)
            .map(|i| Point3::new(i as f32 * 0.1, i as f32 * 0.05, 0.0))
            .collect();
        let out = extract(TestModel::Hands, &hand_with(base), false).unwrap();
        assert_eq!(out.len(), 42);
    }

    #[test]
    fn pose_output_is_66_dim_without_z_and_99_with_z() {
        let lm = FrameLandmarks {
            hands: vec![],
            pose: Some(PoseLandmarks {
                points: flat_pose(33),
            }),
        };
        let out_2d = extract(TestModel::Pose, &lm, false).unwrap();
        let out_3d = extract(TestModel::Pose, &lm, true).unwrap();
        assert_eq!(out_2d.len(), 66);
        assert_eq!(out_3d.len(), 99);
    }

    #[test]
    fn pose_drops_below_33_points() {
        let lm = FrameLandmarks {
            hands: vec![],
            pose: Some(PoseLandmarks {
                points: flat_pose(10),
            }),
        };
        assert_eq!(
            extract(TestModel::Pose, &lm, false),
            Err(ExtractError::Drop("pose"))
        );
    }

    #[test]
    fn finger_output_is_8_dim() {
        let base: Vec<Point3> = (0..21)
            .map(|i| Point3::new(i as f32 * 0.1, i as f32 * 0.05, 0.0))
            .collect();
        let out = extract(TestModel::Finger, &hand_with(base), false).unwrap();
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn null_landmark_source_always_detects_nothing() {
        let source = NullLandmarkSource;
        let result = source.detect(&[0u8; 4]);
        assert_eq!(result, FrameLandmarks::default());
    }
}
