//! Media Capture Boundary
//!
//! Everything the integrity monitor consumes from the capture devices:
//! - Camera frames and still-image snapshots
//! - The face-landmark detector capability (`detect(frame) -> faces`)
//! - Microphone and screen-capture streams with user-revocable tracks
//! - The recording encoder
//! - The capture driver pairing a camera with a detector

pub mod driver;
pub mod frame;
pub mod landmarks;
pub mod media;

pub use driver::{CaptureDriver, CapturedFrame};
pub use frame::VideoFrame;
pub use landmarks::{FaceLandmarks, FrameObservation, LandmarkDetector, Point3};
pub use media::{FrameSource, MediaDevices, MediaEncoder, MediaStream, MediaTrack, TrackKind};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capture error types
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Permission denied for {0}")]
    PermissionDenied(String),

    #[error("Device unavailable: {0}")]
    Unavailable(String),

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Landmark detection failed: {0}")]
    Detector(String),

    #[error("Snapshot encoding failed: {0}")]
    Snapshot(String),
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Requested capture width
    pub width: u32,
    /// Requested capture height
    pub height: u32,
    /// Target FPS (the detector is driven at this rate)
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}
