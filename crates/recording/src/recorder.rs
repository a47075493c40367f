//! Recorder state machine

use crate::{ChunkBuffer, RecordingError};
use alerting::EventDispatcher;
use backend_client::{BackendApi, RecordingUpload};
use chrono::Utc;
use integrity_events::EventKind;
use media_capture::{MediaDevices, MediaEncoder, MediaStream, MediaTrack};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// What the active recording produced
#[derive(Debug)]
pub enum RecorderSignal {
    Chunk(Vec<u8>),
    /// The encoder stopped on its own
    EncoderStopped,
    /// The user stopped sharing through the browser's own control
    ScreenShareEnded,
}

/// Result of the upload that closes a stop cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Saved,
    Failed,
}

/// Streams acquired for one recording; stopped when dropped
#[derive(Default)]
struct AcquiredStreams(Vec<MediaStream>);

impl Drop for AcquiredStreams {
    fn drop(&mut self) {
        for stream in &self.0 {
            stream.stop_all();
        }
    }
}

struct ActiveRecording {
    _streams: AcquiredStreams,
    screen_track: MediaTrack,
    encoder: Box<dyn MediaEncoder>,
    mime_type: String,
}

/// Screen + microphone recorder for one session
pub struct ScreenRecorder {
    devices: Arc<dyn MediaDevices>,
    backend: Arc<dyn BackendApi>,
    dispatcher: EventDispatcher,
    active: Option<ActiveRecording>,
    buffer: ChunkBuffer,
}

impl ScreenRecorder {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        backend: Arc<dyn BackendApi>,
        dispatcher: EventDispatcher,
    ) -> Self {
        Self {
            devices,
            backend,
            dispatcher,
            active: None,
            buffer: ChunkBuffer::new(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn buffered_chunks(&self) -> usize {
        self.buffer.len()
    }

    /// Acquire screen and microphone and start encoding.
    ///
    /// Failure is reported as SCREEN_RECORDING_FAILED and leaves nothing
    /// acquired.
    pub async fn start(&mut self) -> Result<(), RecordingError> {
        if self.active.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }

        match self.acquire().await {
            Ok(active) => {
                self.buffer.clear();
                info!("Screen recording started ({})", active.mime_type);
                self.active = Some(active);
                self.dispatcher.emit(EventKind::ScreenRecordingStarted);
                Ok(())
            }
            Err(e) => {
                warn!("Screen recording failed to start: {}", e);
                self.dispatcher.emit(EventKind::ScreenRecordingFailed);
                Err(e)
            }
        }
    }

    async fn acquire(&self) -> Result<ActiveRecording, RecordingError> {
        let mut streams = AcquiredStreams::default();

        let screen = self.devices.acquire_screen().await?;
        streams.0.push(screen.clone());
        let screen_track = screen
            .video_tracks()
            .next()
            .cloned()
            .ok_or(RecordingError::NoVideoTrack)?;

        let microphone = self.devices.acquire_microphone().await?;
        streams.0.push(microphone.clone());

        let merged = MediaStream::merged(&screen, &microphone);
        let encoder = self.devices.start_encoder(&merged)?;
        let mime_type = encoder.mime_type().to_string();

        Ok(ActiveRecording {
            _streams: streams,
            screen_track,
            encoder,
            mime_type,
        })
    }

    /// Wait for the active recording to produce something. Never resolves
    /// while idle.
    pub async fn next_signal(&mut self) -> RecorderSignal {
        let Some(active) = self.active.as_mut() else {
            return std::future::pending().await;
        };

        tokio::select! {
            chunk = active.encoder.next_chunk() => match chunk {
                Some(chunk) => RecorderSignal::Chunk(chunk),
                None => RecorderSignal::EncoderStopped,
            },
            _ = active.screen_track.ended() => RecorderSignal::ScreenShareEnded,
        }
    }

    /// Apply a signal from [`ScreenRecorder::next_signal`]
    pub async fn handle_signal(
        &mut self,
        signal: RecorderSignal,
    ) -> Option<JoinHandle<UploadOutcome>> {
        match signal {
            RecorderSignal::Chunk(chunk) => {
                debug!("Buffered recording chunk ({} bytes)", chunk.len());
                self.buffer.push(chunk);
                None
            }
            RecorderSignal::ScreenShareEnded => {
                warn!("Screen sharing stopped by the user");
                self.dispatcher.emit(EventKind::ScreenShareStopped);
                self.stop().await.ok().flatten()
            }
            RecorderSignal::EncoderStopped => {
                warn!("Encoder stopped unexpectedly");
                self.stop().await.ok().flatten()
            }
        }
    }

    /// Stop encoding, release every track and upload what was buffered.
    ///
    /// Returns the upload task, or `None` when no chunks were buffered. The
    /// buffer is empty afterwards either way.
    pub async fn stop(&mut self) -> Result<Option<JoinHandle<UploadOutcome>>, RecordingError> {
        let mut active = self.active.take().ok_or(RecordingError::NotRecording)?;

        match active.encoder.finish().await {
            Ok(chunks) => chunks.into_iter().for_each(|c| self.buffer.push(c)),
            Err(e) => warn!(
                "Encoder flush failed, keeping {} buffered chunks: {}",
                self.buffer.len(),
                e
            ),
        }
        let mime_type = std::mem::take(&mut active.mime_type);
        drop(active);
        info!(
            "Screen recording stopped ({} chunks, {} bytes buffered)",
            self.buffer.len(),
            self.buffer.total_bytes()
        );

        let Some(data) = self.buffer.take() else {
            info!("No recording chunks buffered, nothing to upload");
            return Ok(None);
        };

        let session_id = self.dispatcher.session_id().to_string();
        let upload = RecordingUpload {
            file_name: format!(
                "screen-recording-{}-{}.{}",
                session_id,
                Utc::now().format("%Y%m%dT%H%M%SZ"),
                extension(&mime_type)
            ),
            mime_type,
            data,
        };

        let backend = self.backend.clone();
        let dispatcher = self.dispatcher.clone();
        Ok(Some(tokio::spawn(async move {
            match backend.upload_recording(&session_id, upload).await {
                Ok(()) => {
                    dispatcher.emit(EventKind::ScreenRecordingSaved);
                    UploadOutcome::Saved
                }
                Err(e) => {
                    error!("Screen recording upload failed: {}", e);
                    dispatcher.emit(EventKind::ScreenRecordingUploadFailed);
                    UploadOutcome::Failed
                }
            }
        })))
    }
}

fn extension(mime_type: &str) -> &'static str {
    let container = mime_type.split(';').next().unwrap_or_default().trim();
    match container {
        "video/webm" => "webm",
        "video/mp4" => "mp4",
        _ => "bin",
    }
}
