//! Synthetic face meshes
//!
//! Builds a full 478-point landmark set whose head-yaw and gaze offsets are
//! known in advance. Used to drive the monitor without a camera.

use crate::kernel::landmark;
use media_capture::{FaceLandmarks, Point3};

const MESH_POINTS: usize = 478;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceSpec {
    /// Head-yaw offset the face should produce
    pub yaw: f32,
    /// Gaze offset the face should produce
    pub gaze: f32,
    /// Spread of the free mesh points; anything but 1.0 reads as someone else
    pub scale: f32,
}

impl Default for FaceSpec {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            gaze: 0.0,
            scale: 1.0,
        }
    }
}

pub fn face(spec: FaceSpec) -> FaceLandmarks {
    let mut points: Vec<Point3> = (0..MESH_POINTS)
        .map(|i| {
            let i = i as f32;
            Point3::new(
                0.5 + 0.1 * spec.scale * (i * 0.37).sin(),
                0.5 + 0.1 * spec.scale * (i * 0.53).cos(),
                0.01 * i.sin(),
            )
        })
        .collect();

    points[landmark::LEFT_CHEEK] = Point3::new(0.3, 0.55, 0.0);
    points[landmark::RIGHT_CHEEK] = Point3::new(0.7, 0.55, 0.0);
    points[landmark::NOSE_TIP] = Point3::new(0.5 + spec.yaw * 0.4, 0.55, -0.05);

    points[landmark::LEFT_EYE_OUTER] = Point3::new(0.35, 0.45, 0.0);
    points[landmark::LEFT_EYE_INNER] = Point3::new(0.45, 0.45, 0.0);
    points[landmark::RIGHT_EYE_INNER] = Point3::new(0.55, 0.45, 0.0);
    points[landmark::RIGHT_EYE_OUTER] = Point3::new(0.65, 0.45, 0.0);
    points[landmark::LEFT_IRIS_CENTER] = Point3::new(0.40 + spec.gaze * 0.1, 0.45, 0.0);
    points[landmark::RIGHT_IRIS_CENTER] = Point3::new(0.60 + spec.gaze * 0.1, 0.45, 0.0);

    FaceLandmarks::new(points)
}
