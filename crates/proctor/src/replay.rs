//! Scripted session replay
//!
//! A script is JSON lines, one step per line:
//!
//! ```text
//! {"frames": {"faces": 1, "count": 45}}
//! {"input": "confirm_identity"}
//! {"frames": {"faces": 1, "yaw": 0.4, "count": 20}}
//! {"input": "visibility_changed", "hidden": true}
//! {"wait_ms": 500}
//! {"action": "revoke_screen"}
//! {"input": "end_interview"}
//! ```
//!
//! Frames go to a replay camera whose detector reports the scripted faces;
//! inputs go to the session through its handle.

use crate::config::ProctorConfig;
use crate::surfaces::{LogShell, LogSurface};
use alerting::EventLog;
use async_trait::async_trait;
use backend_client::BackendApi;
use integrity_monitor::synthetic::{self, FaceSpec};
use media_capture::{
    CameraConfig, CaptureError, FaceLandmarks, FrameObservation, FrameSource, LandmarkDetector,
    MediaDevices, MediaEncoder, MediaStream, MediaTrack, TrackKind, VideoFrame,
};
use serde::Deserialize;
use session_control::{
    SessionController, SessionError, SessionHandle, SessionInput, SessionServices, SessionState,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval};
use tracing::{debug, info, warn};

/// Script error types
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Failed to read script: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

/// A run of identical synthetic frames
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyntheticFrames {
    pub faces: usize,
    /// Head-yaw offset each face produces
    pub yaw: f32,
    /// Gaze offset each face produces
    pub gaze: f32,
    /// Spread of the free mesh points; anything but 1.0 reads as someone else
    pub scale: f32,
    pub count: u32,
}

impl Default for SyntheticFrames {
    fn default() -> Self {
        Self {
            faces: 1,
            yaw: 0.0,
            gaze: 0.0,
            scale: 1.0,
            count: 1,
        }
    }
}

impl SyntheticFrames {
    pub fn observation(&self) -> FrameObservation {
        FrameObservation::new((0..self.faces).map(|_| self.face()).collect())
    }

    fn face(&self) -> FaceLandmarks {
        synthetic::face(FaceSpec {
            yaw: self.yaw,
            gaze: self.gaze,
            scale: self.scale,
        })
    }
}

/// Device-side actions a script can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayAction {
    /// The candidate stops sharing from the browser's own control
    RevokeScreen,
}

/// One script line
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    Input(SessionInput),
    Frames { frames: SyntheticFrames },
    /// One frame with explicit landmark sets
    Faces { faces: Vec<FaceLandmarks> },
    Wait { wait_ms: u64 },
    Action { action: ReplayAction },
}

/// Parse a script. Blank lines and lines starting with `#` are skipped.
pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, text)| {
            serde_json::from_str(text).map_err(|source| ScriptError::Parse { line, source })
        })
        .collect()
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>, ScriptError> {
    let text = std::fs::read_to_string(path)?;
    parse_script(&text)
}

type PendingFrames = Arc<Mutex<HashMap<u32, FrameObservation>>>;

/// Devices fed from a script
pub struct ReplayDevices {
    frame_tx: mpsc::Sender<FrameObservation>,
    frame_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<FrameObservation>>>,
    pending: PendingFrames,
    sequence: Arc<AtomicU32>,
    screen: Mutex<Option<MediaTrack>>,
    chunk_interval: Duration,
}

impl ReplayDevices {
    pub fn new(chunk_interval: Duration) -> Self {
        let (frame_tx, frame_rx) = mpsc::channel(1);
        Self {
            frame_tx,
            frame_rx: Arc::new(tokio::sync::Mutex::new(frame_rx)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            sequence: Arc::new(AtomicU32::new(0)),
            screen: Mutex::new(None),
            chunk_interval,
        }
    }

    /// Queue one frame for whichever camera is open. Waits while the
    /// previous frame has not been picked up.
    pub async fn push(&self, observation: FrameObservation) -> bool {
        self.frame_tx.send(observation).await.is_ok()
    }

    /// End the shared screen track from the device side
    pub fn revoke_screen(&self) -> bool {
        let track = self.screen.lock().unwrap_or_else(PoisonError::into_inner).take();
        match track {
            Some(track) => {
                track.end();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl MediaDevices for ReplayDevices {
    async fn open_camera(
        &self,
        config: &CameraConfig,
    ) -> Result<Box<dyn FrameSource>, CaptureError> {
        Ok(Box::new(ReplayCamera {
            frames: self.frame_rx.clone(),
            pending: self.pending.clone(),
            sequence: self.sequence.clone(),
            width: config.width,
            height: config.height,
            stopped: false,
        }))
    }

    async fn landmark_detector(&self) -> Result<Box<dyn LandmarkDetector>, CaptureError> {
        Ok(Box::new(ReplayDetector {
            pending: self.pending.clone(),
        }))
    }

    async fn acquire_screen(&self) -> Result<MediaStream, CaptureError> {
        let track = MediaTrack::new(TrackKind::Video, "replay-screen");
        *self.screen.lock().unwrap_or_else(PoisonError::into_inner) = Some(track.clone());
        Ok(MediaStream::new(vec![track]))
    }

    async fn acquire_microphone(&self) -> Result<MediaStream, CaptureError> {
        Ok(MediaStream::new(vec![MediaTrack::new(TrackKind::Audio, "replay-microphone")]))
    }

    fn start_encoder(&self, stream: &MediaStream) -> Result<Box<dyn MediaEncoder>, CaptureError> {
        if stream.video_tracks().next().is_none() {
            return Err(CaptureError::Encoder("no video track to encode".into()));
        }
        Ok(Box::new(ReplayEncoder::new(self.chunk_interval)))
    }
}

struct ReplayCamera {
    frames: Arc<tokio::sync::Mutex<mpsc::Receiver<FrameObservation>>>,
    pending: PendingFrames,
    sequence: Arc<AtomicU32>,
    width: u32,
    height: u32,
    stopped: bool,
}

#[async_trait]
impl FrameSource for ReplayCamera {
    async fn next_frame(&mut self) -> Option<VideoFrame> {
        if self.stopped {
            return None;
        }
        let observation = {
            let mut frames = self.frames.lock().await;
            frames.recv().await?
        };

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sequence, observation);
        Some(VideoFrame::filled(self.width, self.height, [128, 128, 128], sequence))
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

struct ReplayDetector {
    pending: PendingFrames,
}

#[async_trait]
impl LandmarkDetector for ReplayDetector {
    async fn detect(&mut self, frame: &VideoFrame) -> Result<FrameObservation, CaptureError> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&frame.sequence)
            .ok_or_else(|| {
                CaptureError::Detector(format!("no scripted faces for frame {}", frame.sequence))
            })
    }
}

struct ReplayEncoder {
    ticker: Interval,
    produced: u32,
}

impl ReplayEncoder {
    fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        Self {
            ticker: tokio::time::interval_at(Instant::now() + period, period),
            produced: 0,
        }
    }
}

#[async_trait]
impl MediaEncoder for ReplayEncoder {
    fn mime_type(&self) -> &str {
        "video/webm;codecs=vp8,opus"
    }

    async fn next_chunk(&mut self) -> Option<Vec<u8>> {
        self.ticker.tick().await;
        self.produced += 1;
        Some(vec![(self.produced % 251) as u8; 4096])
    }

    async fn finish(&mut self) -> Result<Vec<Vec<u8>>, CaptureError> {
        debug!("Replay encoder finished after {} chunks", self.produced);
        Ok(vec![vec![0; 512]])
    }
}

/// How a replayed session ended
pub struct ReplayOutcome {
    pub state: SessionState,
    pub events: EventLog,
}

/// Run one session against `backend`, driven by `steps`
pub async fn run_session(
    config: &ProctorConfig,
    steps: Vec<ScriptStep>,
    backend: Arc<dyn BackendApi>,
) -> Result<ReplayOutcome, SessionError> {
    let devices = Arc::new(ReplayDevices::new(Duration::from_millis(
        config.replay.chunk_interval_ms,
    )));
    let services = SessionServices {
        devices: devices.clone(),
        backend,
        shell: Arc::new(LogShell::new(config.replay.confirm_exit)),
        surface: Arc::new(LogSurface),
    };

    let (mut controller, handle) =
        SessionController::create(config.session.clone(), services).await?;
    controller.begin_verification().await?;

    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(config.session.camera.fps.max(1)));
    let feeder = tokio::spawn(feed(steps, devices, handle, frame_interval));

    let state = controller.run().await?;
    feeder.abort();

    let events = controller.event_log();
    info!(
        "Session {} finished {} with {} events",
        controller.session_id(),
        state,
        events.len()
    );
    Ok(ReplayOutcome { state, events })
}

async fn feed(
    steps: Vec<ScriptStep>,
    devices: Arc<ReplayDevices>,
    handle: SessionHandle,
    frame_interval: Duration,
) {
    for step in steps {
        match step {
            ScriptStep::Input(input) => {
                if handle.send(input).is_err() {
                    return;
                }
            }
            ScriptStep::Frames { frames } => {
                let observation = frames.observation();
                for _ in 0..frames.count {
                    if !devices.push(observation.clone()).await {
                        return;
                    }
                    tokio::time::sleep(frame_interval).await;
                }
            }
            ScriptStep::Faces { faces } => {
                if !devices.push(FrameObservation::new(faces)).await {
                    return;
                }
                tokio::time::sleep(frame_interval).await;
            }
            ScriptStep::Wait { wait_ms } => {
                tokio::time::sleep(Duration::from_millis(wait_ms)).await
            }
            ScriptStep::Action {
                action: ReplayAction::RevokeScreen,
            } => {
                if !devices.revoke_screen() {
                    warn!("Script revoked the screen share but none is active");
                }
            }
        }
    }
    debug!("Script finished");
}
