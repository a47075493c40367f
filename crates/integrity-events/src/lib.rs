//! Integrity Events
//!
//! The discrete, severity-tagged events the monitor reports:
//! - Camera anomalies (missing face, extra faces, identity mismatch, head/eye)
//! - Environment transitions (tab switch, window blur/focus, fullscreen exits)
//! - Recording pipeline outcomes
//! - Interview lifecycle terminations
//!
//! An [`IntegrityEvent`] serializes directly to the backend's event body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integrity event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// No face in frame for the configured number of frames
    FaceMissing,
    /// More than one face in a single frame
    MultipleFaces,
    /// Face no longer matches the verified baseline
    FaceMismatch,
    /// Head turned away beyond the yaw threshold
    HeadTurned,
    /// Gaze drifted from the session's own gaze baseline
    EyeMovement,
    TabSwitch,
    WindowBlur,
    WindowFocus,
    FullscreenExitWarning,
    FullscreenExitLimitExceeded,
    ScreenRecordingStarted,
    ScreenRecordingFailed,
    /// User stopped sharing through the browser's own control
    ScreenShareStopped,
    ScreenRecordingSaved,
    ScreenRecordingUploadFailed,
    /// Camera denied, unavailable or lost mid-session
    CameraFailed,
    InterviewEnded,
    InterviewExited,
}

impl EventKind {
    /// Fixed severity of each kind
    pub fn severity(&self) -> Severity {
        match self {
            EventKind::FaceMissing
            | EventKind::MultipleFaces
            | EventKind::FaceMismatch
            | EventKind::FullscreenExitLimitExceeded
            | EventKind::ScreenRecordingFailed
            | EventKind::ScreenShareStopped
            | EventKind::ScreenRecordingUploadFailed
            | EventKind::CameraFailed
            | EventKind::InterviewExited => Severity::High,

            EventKind::HeadTurned
            | EventKind::EyeMovement
            | EventKind::TabSwitch
            | EventKind::FullscreenExitWarning => Severity::Medium,

            EventKind::WindowBlur
            | EventKind::WindowFocus
            | EventKind::ScreenRecordingStarted
            | EventKind::ScreenRecordingSaved
            | EventKind::InterviewEnded => Severity::Low,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::FaceMissing => "FACE_MISSING",
            EventKind::MultipleFaces => "MULTIPLE_FACES",
            EventKind::FaceMismatch => "FACE_MISMATCH",
            EventKind::HeadTurned => "HEAD_TURNED",
            EventKind::EyeMovement => "EYE_MOVEMENT",
            EventKind::TabSwitch => "TAB_SWITCH",
            EventKind::WindowBlur => "WINDOW_BLUR",
            EventKind::WindowFocus => "WINDOW_FOCUS",
            EventKind::FullscreenExitWarning => "FULLSCREEN_EXIT_WARNING",
            EventKind::FullscreenExitLimitExceeded => "FULLSCREEN_EXIT_LIMIT_EXCEEDED",
            EventKind::ScreenRecordingStarted => "SCREEN_RECORDING_STARTED",
            EventKind::ScreenRecordingFailed => "SCREEN_RECORDING_FAILED",
            EventKind::ScreenShareStopped => "SCREEN_SHARE_STOPPED",
            EventKind::ScreenRecordingSaved => "SCREEN_RECORDING_SAVED",
            EventKind::ScreenRecordingUploadFailed => "SCREEN_RECORDING_UPLOAD_FAILED",
            EventKind::CameraFailed => "CAMERA_FAILED",
            EventKind::InterviewEnded => "INTERVIEW_ENDED",
            EventKind::InterviewExited => "INTERVIEW_EXITED",
        }
    }

    /// Candidate-facing alert text
    pub fn alert_message(&self) -> &'static str {
        match self {
            EventKind::FaceMissing => "Face not detected. Please stay in front of the camera.",
            EventKind::MultipleFaces => "Multiple faces detected.",
            EventKind::FaceMismatch => "The person in frame does not match the verified candidate.",
            EventKind::HeadTurned => "Please face the screen.",
            EventKind::EyeMovement => "Please keep your eyes on the screen.",
            EventKind::TabSwitch => "Switching tabs is not allowed during the interview.",
            EventKind::WindowBlur => "The interview window lost focus.",
            EventKind::WindowFocus => "The interview window regained focus.",
            EventKind::FullscreenExitWarning => "Fullscreen is required. Returning to fullscreen.",
            EventKind::FullscreenExitLimitExceeded => {
                "Fullscreen exit limit exceeded. The interview has been ended."
            }
            EventKind::ScreenRecordingStarted => "Screen recording started.",
            EventKind::ScreenRecordingFailed => "Screen recording could not be started.",
            EventKind::ScreenShareStopped => "Screen sharing was stopped.",
            EventKind::ScreenRecordingSaved => "Screen recording saved.",
            EventKind::ScreenRecordingUploadFailed => "Screen recording upload failed.",
            EventKind::CameraFailed => "Camera unavailable. Please check your camera.",
            EventKind::InterviewEnded => "The interview has ended.",
            EventKind::InterviewExited => "You have exited the interview.",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dispatched integrity event, in the backend's `POST /events` shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityEvent {
    pub session_id: String,
    #[serde(rename = "event_type")]
    pub kind: EventKind,
    pub severity: Severity,
    /// Detector confidence; the client never has one, the backend accepts null
    pub confidence: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl IntegrityEvent {
    /// Event of `kind` at its fixed severity, stamped now
    pub fn new(session_id: impl Into<String>, kind: EventKind) -> Self {
        Self::at(session_id, kind, Utc::now())
    }

    pub fn at(session_id: impl Into<String>, kind: EventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            kind,
            severity: kind.severity(),
            confidence: None,
            timestamp,
        }
    }
}
