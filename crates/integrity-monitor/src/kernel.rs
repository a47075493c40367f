//! Landmark geometry: identity distance, gaze offset and head yaw
//!
//! Pure functions over a single face's landmark set. Every result is a
//! unit-free ratio. Inputs the math cannot handle (missing landmarks,
//! zero-width spans) come back as [`SignalError`] instead of a division by
//! zero; callers treat that as "no signal this frame".

use media_capture::{FaceLandmarks, Point3};
use thiserror::Error;

/// Face-mesh landmark indices (468-point mesh plus the 10 iris points)
pub mod landmark {
    pub const NOSE_TIP: usize = 1;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const LEFT_EYE_INNER: usize = 133;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const LEFT_CHEEK: usize = 234;
    pub const RIGHT_CHEEK: usize = 454;
    pub const LEFT_IRIS_CENTER: usize = 468;
    pub const RIGHT_IRIS_CENTER: usize = 473;
}

/// Spans narrower than this are treated as zero
const MIN_SPAN: f32 = 1e-6;

/// Why a signal could not be computed for a frame
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("Landmark {0} missing from observation")]
    MissingLandmark(usize),

    #[error("Degenerate geometry: {0}")]
    Degenerate(&'static str),

    #[error("Landmark count mismatch: current {current}, baseline {baseline}")]
    CardinalityMismatch { current: usize, baseline: usize },

    #[error("Empty landmark set")]
    Empty,
}

fn point(face: &FaceLandmarks, index: usize) -> Result<&Point3, SignalError> {
    face.get(index).ok_or(SignalError::MissingLandmark(index))
}

fn finite(value: f32, what: &'static str) -> Result<f32, SignalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SignalError::Degenerate(what))
    }
}

/// Mean distance between corresponding points once both sets are
/// translated so the nose tip sits at the origin
pub fn identity_distance(
    current: &FaceLandmarks,
    baseline: &FaceLandmarks,
) -> Result<f32, SignalError> {
    if current.len() != baseline.len() {
        return Err(SignalError::CardinalityMismatch {
            current: current.len(),
            baseline: baseline.len(),
        });
    }
    if current.is_empty() {
        return Err(SignalError::Empty);
    }
    if current == baseline {
        return Ok(0.0);
    }

    let current_origin = point(current, landmark::NOSE_TIP)?;
    let baseline_origin = point(baseline, landmark::NOSE_TIP)?;

    let total: f32 = current
        .points
        .iter()
        .zip(&baseline.points)
        .map(|(c, b)| c.sub(current_origin).sub(&b.sub(baseline_origin)).norm())
        .sum();

    finite(total / current.len() as f32, "identity distance")
}

/// Horizontal iris deviation from the eye-corner midpoint, as a fraction
/// of eye width
fn eye_offset(
    face: &FaceLandmarks,
    corner_a: usize,
    corner_b: usize,
    iris: usize,
) -> Result<f32, SignalError> {
    let a = point(face, corner_a)?;
    let b = point(face, corner_b)?;
    let iris = point(face, iris)?;

    let width = (a.x - b.x).abs();
    if !(width > MIN_SPAN) {
        return Err(SignalError::Degenerate("eye width"));
    }
    let center = (a.x + b.x) / 2.0;
    finite((iris.x - center) / width, "eye offset")
}

/// Iris offset averaged over both eyes. Signed: negative toward the
/// image's left.
///
/// Requires the iris landmarks; plain face-mesh output without them
/// yields [`SignalError::MissingLandmark`].
pub fn gaze_offset(face: &FaceLandmarks) -> Result<f32, SignalError> {
    let left = eye_offset(
        face,
        landmark::LEFT_EYE_OUTER,
        landmark::LEFT_EYE_INNER,
        landmark::LEFT_IRIS_CENTER,
    )?;
    let right = eye_offset(
        face,
        landmark::RIGHT_EYE_INNER,
        landmark::RIGHT_EYE_OUTER,
        landmark::RIGHT_IRIS_CENTER,
    )?;
    Ok((left + right) / 2.0)
}

/// Nose-tip horizontal deviation from the cheek midpoint, as a fraction of
/// the cheek span. Signed.
pub fn head_yaw_offset(face: &FaceLandmarks) -> Result<f32, SignalError> {
    let nose = point(face, landmark::NOSE_TIP)?;
    let left = point(face, landmark::LEFT_CHEEK)?;
    let right = point(face, landmark::RIGHT_CHEEK)?;

    let span = (right.x - left.x).abs();
    if !(span > MIN_SPAN) {
        return Err(SignalError::Degenerate("cheek span"));
    }
    let mid = (left.x + right.x) / 2.0;
    finite((nose.x - mid) / span, "head yaw")
}
