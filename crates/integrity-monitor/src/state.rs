//! Per-session detector state

use crate::{HysteresisGate, MonitorConfig};

/// One debounce gate per anomaly type, so incidents never share a counter
#[derive(Debug, Clone)]
pub struct DetectorBank {
    pub face_missing: HysteresisGate,
    pub identity_mismatch: HysteresisGate,
    pub head_turn: HysteresisGate,
    pub gaze: HysteresisGate,
}

impl DetectorBank {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            face_missing: HysteresisGate::new(config.face_missing_frames),
            identity_mismatch: HysteresisGate::new(config.identity_mismatch_frames),
            head_turn: HysteresisGate::new(config.head_turn_frames),
            gaze: HysteresisGate::new(config.gaze_frames),
        }
    }

    /// Reset the detectors that need exactly one face in frame
    pub fn reset_face_signals(&mut self) {
        self.identity_mismatch.reset();
        self.head_turn.reset();
        self.gaze.reset();
    }

    /// Reset every counter
    pub fn reset(&mut self) {
        self.face_missing.reset();
        self.identity_mismatch.reset();
        self.head_turn.reset();
        self.gaze.reset();
    }
}
