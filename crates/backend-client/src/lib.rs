//! Backend Client
//!
//! Calls the interview backend's HTTP contract:
//! - Session creation, start and end
//! - Identity snapshot and screen-recording uploads
//! - Integrity event ingestion
//!
//! Only session creation and start gate the client's progress; every other
//! call is made best-effort by its caller.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use integrity_events::IntegrityEvent;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backend error types
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// API root, e.g. `http://127.0.0.1:8000/api/v1`
    pub base_url: String,
    /// Per-request timeout
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/v1".to_string(),
            timeout_ms: 5000,
        }
    }
}

/// `POST /sessions` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub status: String,
}

/// `POST /sessions/{id}/start` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub status: String,
}

/// A finished screen recording ready for upload
#[derive(Debug, Clone)]
pub struct RecordingUpload {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// The backend's HTTP contract
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn create_session(&self) -> Result<SessionInfo, BackendError>;

    async fn start_session(&self, session_id: &str) -> Result<SessionStatus, BackendError>;

    async fn upload_auth_snapshot(
        &self,
        session_id: &str,
        image_base64: &str,
    ) -> Result<(), BackendError>;

    async fn upload_recording(
        &self,
        session_id: &str,
        recording: RecordingUpload,
    ) -> Result<(), BackendError>;

    async fn end_session(&self, session_id: &str) -> Result<(), BackendError>;

    async fn post_event(&self, event: &IntegrityEvent) -> Result<(), BackendError>;
}
