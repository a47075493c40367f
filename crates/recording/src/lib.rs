//! Screen Recording Pipeline
//!
//! Captures the screen's video together with the microphone's audio,
//! buffers the encoder's chunks and uploads them as one file when the
//! recording stops. Each start begins with an empty buffer.

mod buffer;
mod recorder;

pub use buffer::ChunkBuffer;
pub use recorder::{RecorderSignal, ScreenRecorder, UploadOutcome};

use media_capture::CaptureError;
use thiserror::Error;

/// Recording error types
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No recording in progress")]
    NotRecording,

    #[error("Screen capture returned no video track")]
    NoVideoTrack,

    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),
}
