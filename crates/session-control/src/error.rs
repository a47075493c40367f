use crate::SessionState;
use backend_client::BackendError;
use integrity_monitor::MonitorError;
use media_capture::CaptureError;
use recording::RecordingError;
use thiserror::Error;

/// Session error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },

    #[error("Backend call failed: {0}")]
    Backend(#[from] BackendError),

    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Identity gate: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Recording: {0}")]
    Recording(#[from] RecordingError),

    #[error("Session task is gone")]
    Closed,
}
