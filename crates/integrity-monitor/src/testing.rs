//! Test helpers on top of the synthetic faces

pub use crate::synthetic::{face, FaceSpec};
use media_capture::{CapturedFrame, FrameObservation, VideoFrame};

pub fn observation(faces: usize) -> FrameObservation {
    FrameObservation::new((0..faces).map(|_| face(FaceSpec::default())).collect())
}

pub fn with_face(spec: FaceSpec) -> FrameObservation {
    FrameObservation::new(vec![face(spec)])
}

pub fn captured(observation: FrameObservation) -> CapturedFrame {
    CapturedFrame {
        frame: VideoFrame::filled(8, 8, [120, 110, 100], 0),
        observation,
    }
}
