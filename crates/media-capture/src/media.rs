//! Media streams, tracks and the device boundary

use crate::{CameraConfig, CaptureError, LandmarkDetector, VideoFrame};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// Track media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
}

#[derive(Debug)]
struct TrackInner {
    id: Uuid,
    kind: TrackKind,
    label: String,
    ended: CancellationToken,
    stopped: AtomicBool,
}

/// Handle to a live capture track
///
/// Clones share the same underlying track. The track ends either when the
/// client calls [`MediaTrack::stop`] or when the device side calls
/// [`MediaTrack::end`] (the user revoked screen sharing, the device went
/// away).
#[derive(Debug, Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: Uuid::new_v4(),
                kind,
                label: label.into(),
                ended: CancellationToken::new(),
                stopped: AtomicBool::new(false),
            }),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    /// Device-side end signal
    pub fn end(&self) {
        self.inner.ended.cancel();
    }

    /// Release the track. Idempotent.
    pub fn stop(&self) {
        if !self.inner.stopped.swap(true, Ordering::AcqRel) {
            debug!(
                "Stopping {:?} track '{}' ({})",
                self.inner.kind, self.inner.label, self.inner.id
            );
        }
        self.inner.ended.cancel();
    }

    /// Whether the client released this track
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Resolves once the track has ended for any reason
    pub async fn ended(&self) {
        self.inner.ended.cancelled().await
    }
}

/// A set of tracks acquired together
#[derive(Debug, Clone, Default)]
pub struct MediaStream {
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Video)
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Audio)
    }

    /// Combine the video tracks of `video` with the audio tracks of `audio`
    pub fn merged(video: &MediaStream, audio: &MediaStream) -> MediaStream {
        let tracks = video
            .video_tracks()
            .chain(audio.audio_tracks())
            .cloned()
            .collect();
        MediaStream { tracks }
    }

    /// Stop every track in the stream
    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

/// Camera frame stream
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` once the stream has ended
    async fn next_frame(&mut self) -> Option<VideoFrame>;

    /// Release the camera. Must be idempotent.
    fn stop(&mut self);
}

/// Encoder turning a merged stream into recording chunks
#[async_trait]
pub trait MediaEncoder: Send {
    /// Container mime type of the produced chunks
    fn mime_type(&self) -> &str;

    /// Next encoded chunk; `None` once the encoder stopped producing
    async fn next_chunk(&mut self) -> Option<Vec<u8>>;

    /// Stop encoding and return the chunks still held by the encoder
    async fn finish(&mut self) -> Result<Vec<Vec<u8>>, CaptureError>;
}

/// Host capture devices
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn open_camera(
        &self,
        config: &CameraConfig,
    ) -> Result<Box<dyn FrameSource>, CaptureError>;

    async fn landmark_detector(&self) -> Result<Box<dyn LandmarkDetector>, CaptureError>;

    /// Screen-capture stream, video only
    async fn acquire_screen(&self) -> Result<MediaStream, CaptureError>;

    async fn acquire_microphone(&self) -> Result<MediaStream, CaptureError>;

    fn start_encoder(&self, stream: &MediaStream) -> Result<Box<dyn MediaEncoder>, CaptureError>;
}
