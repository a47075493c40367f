//! Identity verification gate
//!
//! Waits for a stable single-face observation, captures the session's
//! baseline identity (landmarks plus a JPEG still) and holds it until the
//! candidate confirms.

use crate::{MonitorConfig, MonitorError};
use chrono::{DateTime, Utc};
use media_capture::{CapturedFrame, FaceLandmarks};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const NO_FACE: &str = "No face detected. Please look at the camera.";
const MULTIPLE_FACES: &str = "Multiple faces detected. Only the candidate may be in frame.";
const CAPTURED: &str = "Identity captured. Confirm to begin the interview.";

/// Gate progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationState {
    WaitingForFace,
    Stabilizing,
    Verified,
}

/// The reference identity for one session
#[derive(Debug, Clone)]
pub struct BaselineIdentity {
    pub landmarks: FaceLandmarks,
    /// Base64 JPEG still taken on the capturing frame
    pub snapshot_base64: String,
    pub captured_at: DateTime<Utc>,
}

/// One-shot identity verification
pub struct IdentityGate {
    required_frames: u32,
    jpeg_quality: u8,
    stable_frames: u32,
    state: VerificationState,
    baseline: Option<BaselineIdentity>,
    resolved: bool,
    status: String,
}

impl IdentityGate {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            required_frames: config.verification_stable_frames.max(1),
            jpeg_quality: config.snapshot_jpeg_quality,
            stable_frames: 0,
            state: VerificationState::WaitingForFace,
            baseline: None,
            resolved: false,
            status: NO_FACE.to_string(),
        }
    }

    /// Feed one frame. Frames after verification are ignored.
    pub fn observe(&mut self, captured: &CapturedFrame) -> VerificationState {
        if self.state == VerificationState::Verified {
            return self.state;
        }

        match captured.observation.single_face() {
            Some(face) => {
                self.stable_frames += 1;
                self.state = VerificationState::Stabilizing;
                self.status = format!(
                    "Face detected. Hold still ({}/{})",
                    self.stable_frames.min(self.required_frames),
                    self.required_frames
                );

                if self.stable_frames >= self.required_frames && self.baseline.is_none() {
                    self.capture(captured, face);
                }
            }
            None => {
                let count = captured.observation.face_count();
                if self.stable_frames > 0 {
                    debug!(
                        "Verification reset after {} stable frames ({} faces)",
                        self.stable_frames, count
                    );
                }
                self.stable_frames = 0;
                self.state = VerificationState::WaitingForFace;
                self.status = if count == 0 { NO_FACE } else { MULTIPLE_FACES }.to_string();
            }
        }

        self.state
    }

    fn capture(&mut self, captured: &CapturedFrame, face: &FaceLandmarks) {
        match captured.frame.snapshot_base64(self.jpeg_quality) {
            Ok(snapshot_base64) => {
                self.baseline = Some(BaselineIdentity {
                    landmarks: face.clone(),
                    snapshot_base64,
                    captured_at: Utc::now(),
                });
                self.state = VerificationState::Verified;
                self.status = CAPTURED.to_string();
                info!("Baseline identity captured after {} stable frames", self.stable_frames);
            }
            Err(e) => {
                warn!("Snapshot capture failed, retrying on next frame: {}", e);
            }
        }
    }

    pub fn state(&self) -> VerificationState {
        self.state
    }

    pub fn is_verified(&self) -> bool {
        self.state == VerificationState::Verified
    }

    /// Candidate-facing status text for the current state
    pub fn status_message(&self) -> &str {
        &self.status
    }

    /// The captured still, once verified
    pub fn snapshot(&self) -> Option<&str> {
        self.baseline.as_ref().map(|b| b.snapshot_base64.as_str())
    }

    /// Hand the baseline over. Succeeds once, and only after verification.
    pub fn resolve(&mut self) -> Result<BaselineIdentity, MonitorError> {
        if self.resolved {
            return Err(MonitorError::AlreadyResolved);
        }
        let baseline = self.baseline.clone().ok_or(MonitorError::NotVerified)?;
        self.resolved = true;
        Ok(baseline)
    }
}
