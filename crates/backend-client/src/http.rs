//! reqwest implementation of the backend contract

use crate::{BackendApi, BackendConfig, BackendError, RecordingUpload, SessionInfo, SessionStatus};
use async_trait::async_trait;
use integrity_events::IntegrityEvent;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Serialize)]
struct SnapshotBody<'a> {
    image_base64: &'a str,
}

/// Backend reached over HTTP
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        info!("Backend client targeting {}", config.base_url);
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn create_session(&self) -> Result<SessionInfo, BackendError> {
        let response = self.client.post(self.url("/sessions")).send().await?;
        let info: SessionInfo = Self::decode(response).await?;
        info!("Session {} created ({})", info.session_id, info.status);
        Ok(info)
    }

    async fn start_session(&self, session_id: &str) -> Result<SessionStatus, BackendError> {
        let response = self
            .client
            .post(self.url(&format!("/sessions/{}/start", session_id)))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn upload_auth_snapshot(
        &self,
        session_id: &str,
        image_base64: &str,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.url(&format!("/sessions/{}/auth-snapshot", session_id)))
            .json(&SnapshotBody { image_base64 })
            .send()
            .await?;
        Self::check(response).await?;
        debug!("Auth snapshot uploaded ({} base64 bytes)", image_base64.len());
        Ok(())
    }

    async fn upload_recording(
        &self,
        session_id: &str,
        recording: RecordingUpload,
    ) -> Result<(), BackendError> {
        let size = recording.data.len();
        let part = Part::bytes(recording.data)
            .file_name(recording.file_name)
            .mime_str(&recording.mime_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url(&format!("/sessions/{}/screen-recording", session_id)))
            .multipart(form)
            .send()
            .await?;
        Self::check(response).await?;
        info!("Screen recording uploaded ({} bytes)", size);
        Ok(())
    }

    async fn end_session(&self, session_id: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.url(&format!("/sessions/{}/end", session_id)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn post_event(&self, event: &IntegrityEvent) -> Result<(), BackendError> {
        let response = self.client.post(self.url("/events")).json(event).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use integrity_events::EventKind;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorded {
        calls: Vec<String>,
        bodies: Vec<Value>,
        upload_content_type: Option<String>,
        upload_len: usize,
    }

    type Shared = Arc<Mutex<Recorded>>;

    async fn create(State(rec): State<Shared>) -> Json<Value> {
        rec.lock().unwrap().calls.push("create".into());
        Json(json!({
            "session_id": "s-1",
            "status": "CREATED",
            "created_at": "2024-01-01T00:00:00"
        }))
    }

    async fn start(
        State(rec): State<Shared>,
        Path(id): Path<String>,
    ) -> Result<Json<Value>, StatusCode> {
        rec.lock().unwrap().calls.push(format!("start:{}", id));
        if id == "missing" {
            return Err(StatusCode::BAD_REQUEST);
        }
        Ok(Json(json!({ "session_id": id, "status": "ACTIVE" })))
    }

    async fn snapshot(
        State(rec): State<Shared>,
        Path(id): Path<String>,
        Json(body): Json<Value>,
    ) -> StatusCode {
        let mut rec = rec.lock().unwrap();
        rec.calls.push(format!("snapshot:{}", id));
        rec.bodies.push(body);
        StatusCode::OK
    }

    async fn recording(
        State(rec): State<Shared>,
        Path(id): Path<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> StatusCode {
        let mut rec = rec.lock().unwrap();
        rec.calls.push(format!("recording:{}", id));
        rec.upload_content_type = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        rec.upload_len = body.len();
        StatusCode::OK
    }

    async fn end(State(rec): State<Shared>, Path(id): Path<String>) -> Json<Value> {
        rec.lock().unwrap().calls.push(format!("end:{}", id));
        Json(json!({ "session_id": id, "status": "ENDED" }))
    }

    async fn events(State(rec): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
        let mut rec = rec.lock().unwrap();
        rec.calls.push("event".into());
        rec.bodies.push(body);
        Json(json!({ "event_id": "e-1" }))
    }

    async fn stub_backend() -> (HttpBackend, Shared) {
        let rec: Shared = Arc::default();
        let app = Router::new()
            .route("/api/v1/sessions", post(create))
            .route("/api/v1/sessions/:id/start", post(start))
            .route("/api/v1/sessions/:id/auth-snapshot", post(snapshot))
            .route("/api/v1/sessions/:id/screen-recording", post(recording))
            .route("/api/v1/sessions/:id/end", post(end))
            .route("/api/v1/events", post(events))
            .with_state(rec.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let backend = HttpBackend::new(&BackendConfig {
            base_url: format!("http://{}/api/v1/", addr),
            timeout_ms: 2000,
        })
        .unwrap();
        (backend, rec)
    }

    #[tokio::test]
    async fn test_session_lifecycle_calls() {
        let (backend, rec) = stub_backend().await;

        let info = backend.create_session().await.unwrap();
        assert_eq!(info.session_id, "s-1");
        assert_eq!(info.status, "CREATED");

        let status = backend.start_session("s-1").await.unwrap();
        assert_eq!(status.status, "ACTIVE");

        backend.end_session("s-1").await.unwrap();
        assert_eq!(rec.lock().unwrap().calls, vec!["create", "start:s-1", "end:s-1"]);
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let (backend, _) = stub_backend().await;
        match backend.start_session("missing").await {
            Err(BackendError::Status { status, .. }) => assert_eq!(status, 400),
            other => panic!("expected status error, got {:?}", other.map(|s| s.status)),
        }
    }

    #[tokio::test]
    async fn test_event_and_snapshot_bodies() {
        let (backend, rec) = stub_backend().await;

        backend.upload_auth_snapshot("s-1", "aGVsbG8=").await.unwrap();
        let event = IntegrityEvent::new("s-1", EventKind::TabSwitch);
        backend.post_event(&event).await.unwrap();

        let rec = rec.lock().unwrap();
        assert_eq!(rec.bodies[0], json!({ "image_base64": "aGVsbG8=" }));
        assert_eq!(rec.bodies[1]["event_type"], "TAB_SWITCH");
        assert_eq!(rec.bodies[1]["severity"], "MEDIUM");
        assert_eq!(rec.bodies[1]["session_id"], "s-1");
    }

    #[tokio::test]
    async fn test_recording_is_multipart() {
        let (backend, rec) = stub_backend().await;
        backend
            .upload_recording(
                "s-1",
                RecordingUpload {
                    file_name: "screen.webm".into(),
                    mime_type: "video/webm".into(),
                    data: vec![7; 4096],
                },
            )
            .await
            .unwrap();

        let rec = rec.lock().unwrap();
        assert!(rec
            .upload_content_type
            .as_deref()
            .unwrap()
            .starts_with("multipart/form-data"));
        assert!(rec.upload_len > 4096);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "http://127.0.0.1:1".into(),
            timeout_ms: 500,
        })
        .unwrap();
        assert!(matches!(backend.end_session("s-1").await, Err(BackendError::Request(_))));
    }
}
