//! Face landmark observations and the detector capability

use crate::{CaptureError, VideoFrame};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Normalized model-space landmark point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise difference `self - other`
    pub fn sub(&self, other: &Point3) -> Point3 {
        Point3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Euclidean length
    pub fn norm(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Landmark set for one detected face
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarks {
    pub points: Vec<Point3>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Landmark by model index
    pub fn get(&self, index: usize) -> Option<&Point3> {
        self.points.get(index)
    }
}

/// All faces the detector found in one frame
///
/// Lives for a single frame callback; never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameObservation {
    pub faces: Vec<FaceLandmarks>,
}

impl FrameObservation {
    pub fn new(faces: Vec<FaceLandmarks>) -> Self {
        Self { faces }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// The face, if exactly one was detected
    pub fn single_face(&self) -> Option<&FaceLandmarks> {
        match self.faces.as_slice() {
            [face] => Some(face),
            _ => None,
        }
    }
}

/// Face-landmark detector capability
///
/// Opaque oracle: given a frame it yields zero or more per-face landmark
/// sets. Implementations wrap whatever model the host provides.
#[async_trait]
pub trait LandmarkDetector: Send {
    async fn detect(&mut self, frame: &VideoFrame) -> Result<FrameObservation, CaptureError>;

    /// Release model resources. Called once when the owning driver stops.
    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_face() {
        let face = FaceLandmarks::new(vec![Point3::new(0.1, 0.2, 0.0)]);
        let one = FrameObservation::new(vec![face.clone()]);
        let two = FrameObservation::new(vec![face.clone(), face]);

        assert!(one.single_face().is_some());
        assert!(two.single_face().is_none());
        assert!(FrameObservation::empty().single_face().is_none());
    }

    #[test]
    fn test_landmarks_deserialize_from_point_list() {
        let face: FaceLandmarks =
            serde_json::from_str(r#"[{"x":0.5,"y":0.25,"z":-0.1}]"#).unwrap();
        assert_eq!(face.get(0), Some(&Point3::new(0.5, 0.25, -0.1)));
    }
}
