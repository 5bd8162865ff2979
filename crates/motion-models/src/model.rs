//! The landmark family (`model`) a session/template is keyed by.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Landmark family used to produce features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestModel {
    Hands,
    Pose,
    Finger,
}

impl TestModel {
    /// Expected feature-vector dimensionality for this model.
    ///
    /// Pose is ambiguous between the 2-D (66) and 3-D (99) variants; callers
    /// that need the 3-D width should check `use_z` separately via
    /// `motion_features::pose_feature_dim`.
    pub fn expected_dim(self) -> usize {
        match self {
            TestModel::Hands => 42,
            TestModel::Pose => 66,
            TestModel::Finger => 8,
        }
    }

    /// Dimensionalities a stored template for this model may legally have.
    /// Pose templates may be saved either 2-D (66) or 3-D (99); the
    /// concrete width a session ends up using is only pinned down by the
    /// `DimMismatch` check against the live feature vector at finalize.
    pub fn allowed_dims(self) -> &'static [usize] {
        match self {
            TestModel::Hands => &[42],
            TestModel::Pose => &[66, 99],
            TestModel::Finger => &[8],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TestModel::Hands => "hands",
            TestModel::Pose => "pose",
            TestModel::Finger => "finger",
        }
    }
}

impl fmt::Display for TestModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unsupported model: {0}")]
pub struct UnsupportedModel(pub String);

impl FromStr for TestModel {
    type Err = UnsupportedModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hands" => Ok(TestModel::Hands),
            "pose" => Ok(TestModel::Pose),
            "finger" => Ok(TestModel::Finger),
            other => Err(UnsupportedModel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_models_case_insensitively() {
        assert_eq!("Pose".parse::<TestModel>().unwrap(), TestModel::Pose);
        assert_eq!("HANDS".parse::<TestModel>().unwrap(), TestModel::Hands);
        assert_eq!("finger".parse::<TestModel>().unwrap(), TestModel::Finger);
    }

    #[test]
    fn rejects_unknown_model() {
        assert!("face".parse::<TestModel>().is_err());
    }

    #[test]
    fn expected_dims_match_spec() {
        assert_eq!(TestModel::Hands.expected_dim(), 42);
        assert_eq!(TestModel::Pose.expected_dim(), 66);
        assert_eq!(TestModel::Finger.expected_dim(), 8);
    }

    #[test]
    fn pose_allows_2d_and_3d_templates() {
        assert_eq!(TestModel::Pose.allowed_dims(), &[66, 99]);
        assert_eq!(TestModel::Hands.allowed_dims(), &[42]);
    }
}
