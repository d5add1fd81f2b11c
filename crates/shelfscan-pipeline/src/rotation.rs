//! Rotation estimation and correction from detected shelf lines.
//!
//! A photograph of a bookshelf is rarely perfectly level; the shelf
//! lines carry the tilt. The estimator takes the median segment angle —
//! median rather than mean, so a few stray detections at sharp angles
//! cannot drag the result — and the caller rotates the image by the
//! negated estimate to make shelf lines horizontal.
//!
//! Zero-degree angles are included in the median. Segments here come
//! from the probabilistic transform and are not axis-aligned by
//! construction, so a perfectly horizontal detection is genuine
//! evidence of a level shelf; excluding zeros would bias the estimate
//! away from 0 exactly when no correction is needed.

use image::GrayImage;
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};

use crate::types::{LineSegment, SegmentDetection};

/// Median of a value set; the mean of the two middle values when the
/// count is even. Returns `None` for an empty set.
fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Estimate the image tilt in degrees from a shelf-line detection.
///
/// Returns the median of all segment angles, or `None` when there is
/// nothing to estimate from — both when detection was impossible
/// ([`SegmentDetection::NonePossible`]) and when it ran but found no
/// segments. This is a deliberate branch, not a swallowed error: the
/// caller decides that an undefined tilt means "apply no correction".
///
/// The value to rotate by is the *negation* of this estimate.
#[must_use]
pub fn estimate(detection: &SegmentDetection) -> Option<f64> {
    let segments = detection.segments()?;
    median(segments.iter().map(LineSegment::angle_degrees).collect())
}

/// Rotate an image about its center by `degrees`, keeping dimensions.
///
/// Positive angles follow the segment-angle convention (y grows
/// downward), so rotating by `-estimate` levels the detected tilt.
/// Nearest-neighbor interpolation keeps a two-level input two-level,
/// which the downstream morphology passes assume. Pixels rotated in
/// from outside the frame are black.
///
/// A zero angle returns the image unchanged.
#[must_use = "returns the rotated image"]
pub fn rotate_by(image: &GrayImage, degrees: f64) -> GrayImage {
    if degrees == 0.0 {
        return image.clone();
    }
    #[allow(clippy::cast_possible_truncation)]
    let theta = degrees.to_radians() as f32;
    rotate_about_center(image, theta, Interpolation::Nearest, image::Luma([0]))
}
