//! Capture driver: camera frames through the landmark detector

use crate::{
    CameraConfig, CaptureError, FrameObservation, FrameSource, LandmarkDetector, MediaDevices,
    VideoFrame,
};
use tracing::{info, trace, warn};

/// A frame together with what the detector saw in it
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub frame: VideoFrame,
    pub observation: FrameObservation,
}

/// Pairs a camera with a landmark detector and yields one observation at a
/// time. The next frame is not pulled until the caller asks for it, so at
/// most one frame is in flight.
///
/// Dropping the driver releases the camera and closes the detector.
pub struct CaptureDriver {
    name: String,
    source: Box<dyn FrameSource>,
    detector: Box<dyn LandmarkDetector>,
    delivered: u64,
    stopped: bool,
}

impl CaptureDriver {
    pub fn new(
        name: impl Into<String>,
        source: Box<dyn FrameSource>,
        detector: Box<dyn LandmarkDetector>,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            detector,
            delivered: 0,
            stopped: false,
        }
    }

    /// Open the camera and detector from the host devices
    pub async fn open(
        name: impl Into<String>,
        devices: &dyn MediaDevices,
        config: &CameraConfig,
    ) -> Result<Self, CaptureError> {
        let name = name.into();
        let mut source = devices.open_camera(config).await?;
        let detector = match devices.landmark_detector().await {
            Ok(detector) => detector,
            Err(e) => {
                source.stop();
                return Err(e);
            }
        };

        info!(
            "Capture driver '{}' opened ({}x{} @ {}fps)",
            name, config.width, config.height, config.fps
        );
        Ok(Self::new(name, source, detector))
    }

    /// Next detected frame, or `None` once the camera stream has ended.
    ///
    /// Frames the detector fails on are skipped.
    pub async fn next_observation(&mut self) -> Option<CapturedFrame> {
        if self.stopped {
            return None;
        }

        loop {
            let frame = self.source.next_frame().await?;
            match self.detector.detect(&frame).await {
                Ok(observation) => {
                    self.delivered += 1;
                    trace!(
                        "'{}' frame {} -> {} face(s)",
                        self.name,
                        frame.sequence,
                        observation.face_count()
                    );
                    metrics::counter!("proctor_frames_processed_total").increment(1);
                    return Some(CapturedFrame { frame, observation });
                }
                Err(e) => {
                    warn!("'{}' skipping frame {}: {}", self.name, frame.sequence, e);
                    metrics::counter!("proctor_frames_skipped_total").increment(1);
                }
            }
        }
    }

    /// Frames delivered so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Release the camera and close the detector. Idempotent.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.source.stop();
        self.detector.close();
        self.stopped = true;
        info!("Capture driver '{}' stopped after {} frames", self.name, self.delivered);
    }
}

impl Drop for CaptureDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
