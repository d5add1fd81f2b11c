//! Line extraction: directional opening followed by the segment transform.
//!
//! Given a binary image and an axis size, retains only long axis-aligned
//! structures and detects them as line segments. This is the shared
//! primitive behind both the shelf-scale scan and the per-region spine
//! scan.

use image::GrayImage;

use crate::morphology;
use crate::types::{Direction, SegmentDetection, TransformParams};

/// Structuring-element length for a scan, or `None` when degenerate.
///
/// The length is the scanned dimension divided by the axis size, floored.
/// `Horizontal` scans are sized by image height, `Vertical` by width.
/// A zero axis size
/// or an axis size exceeding the dimension floors to zero, which is the
/// "no lines possible" state rather than an error.
fn structuring_length(image: &GrayImage, axis_size: u32, direction: Direction) -> Option<u32> {
    let pixels = match direction {
        Direction::Horizontal => image.height(),
        Direction::Vertical => image.width(),
    };
    if axis_size == 0 {
        return None;
    }
    let length = pixels / axis_size;
    (length > 0).then_some(length)
}

/// Extract long axis-aligned line structures and their segments.
///
/// Opens the image with a 1×N (`Horizontal`) or N×1 (`Vertical`)
/// rectangular kernel of length `dimension / axis_size`, then runs the
/// probabilistic segment transform on the opened image. Returns the
/// filtered image together with the detection result.
///
/// When the structuring element degenerates to zero length the input is
/// returned unmodified with [`SegmentDetection::NonePossible`] — a valid
/// empty-result state, not an error. Downstream code must distinguish it
/// from `Found(vec![])` ("the transform ran and found nothing").
///
/// Pure function of its inputs; the output image always has the same
/// dimensions as the input.
#[must_use = "returns the filtered image and the detection result"]
pub fn extract_lines(
    image: &GrayImage,
    axis_size: u32,
    direction: Direction,
    params: &TransformParams,
) -> (GrayImage, SegmentDetection) {
    let Some(length) = structuring_length(image, axis_size, direction) else {
        return (image.clone(), SegmentDetection::NonePossible);
    };

    let opened = morphology::open(image, length, direction);
    let segments = crate::hough::detect_segments(&opened, params);
    (opened, SegmentDetection::Found(segments))
}
