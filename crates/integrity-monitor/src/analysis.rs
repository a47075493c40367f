//! Per-frame analysis results

use integrity_events::EventKind;
use serde::{Deserialize, Serialize};

/// What the monitor computed for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Faces the detector reported
    pub face_count: usize,

    /// Mean landmark distance from the baseline identity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_distance: Option<f32>,

    /// Signed head-yaw offset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_yaw: Option<f32>,

    /// Absolute drift from the session gaze baseline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaze_drift: Option<f32>,

    /// Events this frame fired
    pub events: Vec<EventKind>,
}

impl FrameAnalysis {
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Most severe event fired this frame
    pub fn most_severe(&self) -> Option<EventKind> {
        self.events.iter().copied().max_by_key(|kind| kind.severity())
    }
}
