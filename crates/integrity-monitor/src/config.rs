//! Monitor configuration

use serde::{Deserialize, Serialize};

/// Every detector threshold in one place
///
/// Frame counts assume the detector runs at roughly 30fps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Consecutive empty frames before FACE_MISSING
    pub face_missing_frames: u32,

    /// Mean landmark distance from the baseline counted as a different face
    pub identity_mismatch_distance: f32,

    /// Consecutive mismatching frames before FACE_MISMATCH
    pub identity_mismatch_frames: u32,

    /// Head-yaw offset (fraction of cheek span) counted as turned away
    pub head_yaw_threshold: f32,

    /// Consecutive turned frames before HEAD_TURNED
    pub head_turn_frames: u32,

    /// Gaze drift from the session gaze baseline (fraction of eye width)
    pub gaze_deviation_threshold: f32,

    /// Consecutive drifting frames before EYE_MOVEMENT
    pub gaze_frames: u32,

    /// Consecutive single-face frames before the baseline is captured
    pub verification_stable_frames: u32,

    /// JPEG quality of the verification snapshot
    pub snapshot_jpeg_quality: u8,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            face_missing_frames: 20,
            identity_mismatch_distance: 0.05,
            identity_mismatch_frames: 30,
            head_yaw_threshold: 0.25,
            head_turn_frames: 15,
            gaze_deviation_threshold: 0.15,
            gaze_frames: 20,
            verification_stable_frames: 45,
            snapshot_jpeg_quality: 85,
        }
    }
}

impl MonitorConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            face_missing_frames: 10,
            identity_mismatch_distance: 0.04,
            identity_mismatch_frames: 20,
            head_yaw_threshold: 0.18,
            head_turn_frames: 10,
            gaze_deviation_threshold: 0.10,
            gaze_frames: 12,
            ..Default::default()
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            face_missing_frames: 45,
            identity_mismatch_distance: 0.08,
            identity_mismatch_frames: 60,
            head_yaw_threshold: 0.35,
            head_turn_frames: 30,
            gaze_deviation_threshold: 0.25,
            gaze_frames: 40,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_order() {
        let (strict, default, lenient) =
            (MonitorConfig::strict(), MonitorConfig::default(), MonitorConfig::lenient());

        assert!(strict.face_missing_frames < default.face_missing_frames);
        assert!(default.face_missing_frames < lenient.face_missing_frames);
        assert!(strict.head_yaw_threshold < lenient.head_yaw_threshold);
        assert_eq!(strict.verification_stable_frames, default.verification_stable_frames);
    }
}
