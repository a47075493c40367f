//! Interview Integrity Monitor
//!
//! Turns the per-frame stream of face landmarks into debounced events:
//! - Identity verification and baseline capture
//! - Face missing / multiple faces
//! - Identity mismatch against the baseline
//! - Head turn and gaze drift

pub mod analysis;
pub mod config;
pub mod hysteresis;
pub mod kernel;
pub mod state;
pub mod synthetic;
pub mod verification;

#[cfg(test)]
mod testing;

pub use analysis::FrameAnalysis;
pub use config::MonitorConfig;
pub use hysteresis::HysteresisGate;
pub use kernel::SignalError;
pub use state::DetectorBank;
pub use verification::{BaselineIdentity, IdentityGate, VerificationState};

use integrity_events::EventKind;
use media_capture::{FaceLandmarks, FrameObservation};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Baseline identity already set for this session")]
    BaselineAlreadySet,

    #[error("Identity not verified yet")]
    NotVerified,

    #[error("Verification gate already resolved")]
    AlreadyResolved,
}

/// Continuous integrity monitor for one session
pub struct IntegrityMonitor {
    config: MonitorConfig,
    detectors: DetectorBank,
    baseline: Option<BaselineIdentity>,
    gaze_baseline: Option<f32>,
    active: bool,
}

impl IntegrityMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            detectors: DetectorBank::new(&config),
            baseline: None,
            gaze_baseline: None,
            active: false,
            config,
        }
    }

    /// Install the verified identity. It cannot be replaced afterwards.
    pub fn install_baseline(&mut self, baseline: BaselineIdentity) -> Result<(), MonitorError> {
        if self.baseline.is_some() {
            return Err(MonitorError::BaselineAlreadySet);
        }
        info!("Baseline identity installed ({} landmarks)", baseline.landmarks.len());
        self.baseline = Some(baseline);
        Ok(())
    }

    pub fn baseline(&self) -> Option<&BaselineIdentity> {
        self.baseline.as_ref()
    }

    /// Session gaze reference, taken from the first computable frame
    pub fn gaze_baseline(&self) -> Option<f32> {
        self.gaze_baseline
    }

    /// Frames processed while inactive have no effect
    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            debug!("Integrity monitor {}", if active { "armed" } else { "disarmed" });
            if !active {
                self.detectors.reset();
            }
        }
        self.active = active;
    }

    pub fn detectors(&self) -> &DetectorBank {
        &self.detectors
    }

    /// Analyze one frame's observation
    pub fn process(&mut self, observation: &FrameObservation) -> FrameAnalysis {
        let mut analysis = FrameAnalysis {
            face_count: observation.face_count(),
            ..Default::default()
        };

        if !self.active {
            return analysis;
        }

        let face = match observation.faces.as_slice() {
            [] => {
                self.detectors.reset_face_signals();
                if self.detectors.face_missing.observe(true) {
                    warn!("Face missing for {} frames", self.config.face_missing_frames);
                    analysis.events.push(EventKind::FaceMissing);
                }
                return record(analysis);
            }
            [face] => {
                self.detectors.face_missing.reset();
                face
            }
            faces => {
                self.detectors.face_missing.reset();
                self.detectors.reset_face_signals();
                warn!("{} faces in frame", faces.len());
                analysis.events.push(EventKind::MultipleFaces);
                return record(analysis);
            }
        };

        self.check_identity(face, &mut analysis);
        self.check_head_yaw(face, &mut analysis);
        self.check_gaze(face, &mut analysis);
        record(analysis)
    }

    fn check_identity(&mut self, face: &FaceLandmarks, analysis: &mut FrameAnalysis) {
        let Some(baseline) = &self.baseline else {
            return;
        };

        match kernel::identity_distance(face, &baseline.landmarks) {
            Ok(distance) => {
                analysis.identity_distance = Some(distance);
                let mismatch = distance > self.config.identity_mismatch_distance;
                if self.detectors.identity_mismatch.observe(mismatch) {
                    warn!("Identity mismatch sustained (distance {:.4})", distance);
                    analysis.events.push(EventKind::FaceMismatch);
                }
            }
            Err(e) => {
                debug!("Identity check skipped: {}", e);
                self.detectors.identity_mismatch.reset();
            }
        }
    }

    fn check_head_yaw(&mut self, face: &FaceLandmarks, analysis: &mut FrameAnalysis) {
        match kernel::head_yaw_offset(face) {
            Ok(yaw) => {
                analysis.head_yaw = Some(yaw);
                let turned = yaw.abs() > self.config.head_yaw_threshold;
                if self.detectors.head_turn.observe(turned) {
                    analysis.events.push(EventKind::HeadTurned);
                }
            }
            Err(e) => {
                trace!("No head-yaw signal: {}", e);
                self.detectors.head_turn.reset();
            }
        }
    }

    fn check_gaze(&mut self, face: &FaceLandmarks, analysis: &mut FrameAnalysis) {
        let offset = match kernel::gaze_offset(face) {
            Ok(offset) => offset,
            Err(e) => {
                trace!("No gaze signal: {}", e);
                self.detectors.gaze.reset();
                return;
            }
        };

        let Some(baseline) = self.gaze_baseline else {
            info!("Gaze baseline set at {:.4}", offset);
            self.gaze_baseline = Some(offset);
            return;
        };

        let drift = (offset - baseline).abs();
        analysis.gaze_drift = Some(drift);
        if self.detectors.gaze.observe(drift > self.config.gaze_deviation_threshold) {
            analysis.events.push(EventKind::EyeMovement);
        }
    }
}

fn record(analysis: FrameAnalysis) -> FrameAnalysis {
    for kind in &analysis.events {
        metrics::counter!("proctor_detections_total", "event_type" => kind.as_str()).increment(1);
    }
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{captured, face, observation, with_face, FaceSpec};
    use media_capture::FrameObservation;

    fn monitor(config: MonitorConfig) -> IntegrityMonitor {
        let mut monitor = IntegrityMonitor::new(config);
        monitor.set_active(true);
        monitor
    }

    fn count(
        monitor: &mut IntegrityMonitor,
        obs: &FrameObservation,
        frames: usize,
        kind: EventKind,
    ) -> usize {
        (0..frames)
            .map(|_| monitor.process(obs).events.iter().filter(|k| **k == kind).count())
            .sum()
    }

    fn verified_baseline() -> BaselineIdentity {
        let mut gate = IdentityGate::new(&MonitorConfig {
            verification_stable_frames: 1,
            ..Default::default()
        });
        gate.observe(&captured(with_face(FaceSpec::default())));
        gate.resolve().unwrap()
    }

    #[test]
    fn test_face_missing_needs_full_run() {
        let mut m = monitor(MonitorConfig::default());
        let empty = observation(0);

        assert_eq!(count(&mut m, &empty, 19, EventKind::FaceMissing), 0);
        assert!(m.process(&observation(1)).events.is_empty());
        assert_eq!(m.detectors().face_missing.count(), 0);

        assert_eq!(count(&mut m, &empty, 19, EventKind::FaceMissing), 0);
        assert_eq!(count(&mut m, &empty, 1, EventKind::FaceMissing), 1);
    }

    #[test]
    fn test_twenty_empty_frames_fire_once() {
        let mut m = monitor(MonitorConfig::default());
        assert_eq!(count(&mut m, &observation(0), 20, EventKind::FaceMissing), 1);
    }

    #[test]
    fn test_multiple_faces_fire_immediately() {
        let mut m = monitor(MonitorConfig::default());
        count(&mut m, &observation(0), 5, EventKind::FaceMissing);
        assert_eq!(m.detectors().face_missing.count(), 5);

        let analysis = m.process(&observation(2));
        assert_eq!(analysis.events, vec![EventKind::MultipleFaces]);
        assert_eq!(m.detectors().face_missing.count(), 0);
        // No other detector ran on that frame
        assert!(analysis.head_yaw.is_none());
    }

    #[test]
    fn test_inactive_monitor_is_inert() {
        let mut m = IntegrityMonitor::new(MonitorConfig::default());
        assert_eq!(count(&mut m, &observation(0), 40, EventKind::FaceMissing), 0);
        assert!(m.process(&observation(3)).events.is_empty());
        assert_eq!(m.detectors().face_missing.count(), 0);
        assert!(m.gaze_baseline().is_none());
    }

    #[test]
    fn test_identity_mismatch_is_debounced() {
        let mut m = monitor(MonitorConfig {
            identity_mismatch_frames: 5,
            ..Default::default()
        });
        m.install_baseline(verified_baseline()).unwrap();

        let same = with_face(FaceSpec::default());
        let stranger = with_face(FaceSpec {
            scale: 2.5,
            ..Default::default()
        });

        assert_eq!(m.process(&same).identity_distance, Some(0.0));
        assert_eq!(count(&mut m, &stranger, 4, EventKind::FaceMismatch), 0);
        m.process(&same);
        assert_eq!(count(&mut m, &stranger, 4, EventKind::FaceMismatch), 0);
        assert_eq!(count(&mut m, &stranger, 1, EventKind::FaceMismatch), 1);
    }

    #[test]
    fn test_baseline_cannot_be_replaced() {
        let mut m = monitor(MonitorConfig::default());
        m.install_baseline(verified_baseline()).unwrap();
        assert!(matches!(
            m.install_baseline(verified_baseline()),
            Err(MonitorError::BaselineAlreadySet)
        ));
    }

    #[test]
    fn test_head_turn_without_baseline() {
        let mut m = monitor(MonitorConfig {
            head_turn_frames: 3,
            ..Default::default()
        });
        let turned = with_face(FaceSpec {
            yaw: 0.4,
            ..Default::default()
        });

        assert_eq!(count(&mut m, &turned, 3, EventKind::HeadTurned), 1);
        let analysis = m.process(&turned);
        assert!(analysis.identity_distance.is_none());
        assert!((analysis.head_yaw.unwrap() - 0.4).abs() < 1e-4);
    }

    #[test]
    fn test_face_gap_breaks_head_and_gaze_runs() {
        let mut m = monitor(MonitorConfig {
            head_turn_frames: 15,
            gaze_frames: 3,
            ..Default::default()
        });
        m.process(&with_face(FaceSpec::default()));

        let turned = with_face(FaceSpec {
            yaw: 0.4,
            gaze: 0.5,
            ..Default::default()
        });
        assert_eq!(count(&mut m, &turned, 14, EventKind::HeadTurned), 0);

        m.process(&observation(0));
        assert_eq!(m.detectors().head_turn.count(), 0);
        assert_eq!(m.detectors().gaze.count(), 0);
        assert_eq!(count(&mut m, &turned, 1, EventKind::HeadTurned), 0);

        // one short of firing
        assert_eq!(count(&mut m, &turned, 1, EventKind::EyeMovement), 0);
        assert_eq!(m.detectors().gaze.count(), 2);
        m.process(&observation(2));
        assert_eq!(m.detectors().gaze.count(), 0);
        assert_eq!(count(&mut m, &turned, 2, EventKind::EyeMovement), 0);
    }

    #[test]
    fn test_gaze_drift_is_relative_to_first_frame() {
        let mut m = monitor(MonitorConfig {
            gaze_frames: 2,
            gaze_deviation_threshold: 0.15,
            ..Default::default()
        });

        // A candidate whose neutral gaze sits off-center
        let neutral = with_face(FaceSpec {
            gaze: 0.2,
            ..Default::default()
        });
        let first = m.process(&neutral);
        assert!(first.gaze_drift.is_none());
        assert!((m.gaze_baseline().unwrap() - 0.2).abs() < 1e-4);

        assert_eq!(count(&mut m, &neutral, 10, EventKind::EyeMovement), 0);

        let away = with_face(FaceSpec {
            gaze: -0.1,
            ..Default::default()
        });
        assert_eq!(count(&mut m, &away, 2, EventKind::EyeMovement), 1);
    }

    #[test]
    fn test_missing_iris_skips_gaze_only() {
        let mut m = monitor(MonitorConfig {
            head_turn_frames: 2,
            ..Default::default()
        });
        let mut mesh_only = face(FaceSpec {
            yaw: 0.5,
            ..Default::default()
        });
        mesh_only.points.truncate(468);
        let obs = FrameObservation::new(vec![mesh_only]);

        let analysis = m.process(&obs);
        assert!(analysis.gaze_drift.is_none());
        assert!(m.gaze_baseline().is_none());
        assert_eq!(count(&mut m, &obs, 1, EventKind::HeadTurned), 1);

        // Frames keep flowing normally afterwards
        assert!(m.process(&with_face(FaceSpec::default())).head_yaw.is_some());
        assert!(m.gaze_baseline().is_some());
    }

    #[test]
    fn test_degenerate_face_does_not_abort_frame() {
        let mut m = monitor(MonitorConfig::default());
        m.install_baseline(verified_baseline()).unwrap();

        let obs = FrameObservation::new(vec![FaceLandmarks::default()]);
        let analysis = m.process(&obs);
        assert_eq!(analysis.face_count, 1);
        assert!(analysis.events.is_empty());
        assert!(analysis.identity_distance.is_none());
        assert!(analysis.head_yaw.is_none());
    }
}
