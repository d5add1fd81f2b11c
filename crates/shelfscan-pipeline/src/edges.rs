//! Per-region book-boundary edge scanning.
//!
//! Within one shelf region, candidate book-spine boundaries show up as
//! two families of lines: shelf-parallel horizontal edges (book tops,
//! shelf lips) and vertical spine edges. The scanner runs the line
//! extractor twice — once on the region as-is, once on a 90°-rotated
//! copy so that vertical edges become horizontal — and blends the two
//! filtered images into one composite edge map. The raw segment sets
//! from both passes are returned alongside the blend, in region
//! coordinates, for the eventual boundary-to-spine assignment stage.

use image::GrayImage;
use image::imageops;

use crate::lines::extract_lines;
use crate::types::{Direction, EdgeScan, LineSegment, SegmentDetection, TransformParams};

/// Map a segment detected in the `rotate90` frame back into region
/// coordinates, restoring left-to-right endpoint order.
///
/// `rotate90` sends region pixel (x, y) to (height - 1 - y, x), so the
/// inverse is x = yr, y = height - 1 - xr.
fn to_region_frame(segment: &LineSegment, region_height: u32) -> LineSegment {
    let back = |xr: f64, yr: f64| (yr, f64::from(region_height) - 1.0 - xr);
    let (x1, y1) = back(segment.start.x, segment.start.y);
    let (x2, y2) = back(segment.end.x, segment.end.y);
    if (x1, y1) <= (x2, y2) {
        LineSegment::new(x1, y1, x2, y2)
    } else {
        LineSegment::new(x2, y2, x1, y1)
    }
}

/// Equal-weighted 0.5/0.5 blend of two edge images.
///
/// Halving a full-intensity edge leaves it at 127, comfortably above
/// zero, so neither pass's contribution is erased by the blend.
fn blend(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        let sum = u16::from(a.get_pixel(x, y).0[0]) + u16::from(b.get_pixel(x, y).0[0]);
        #[allow(clippy::cast_possible_truncation)]
        let value = (sum / 2) as u8;
        image::Luma([value])
    })
}

/// Scan one shelf region for candidate book boundaries.
///
/// Runs the horizontal pass directly and the vertical pass on a
/// 90°-rotated copy (one deterministic extractor call per axis), then
/// combines the two filtered images. Vertical-pass segments are mapped
/// back into region coordinates before being returned.
#[must_use = "returns the combined edge map and both detections"]
pub fn scan_edges(region: &GrayImage, axis_size: u32, params: &TransformParams) -> EdgeScan {
    let (horizontal_image, horizontal) =
        extract_lines(region, axis_size, Direction::Horizontal, params);

    // Vertical book edges become horizontal in the rotated copy.
    let rotated = imageops::rotate90(region);
    let (vertical_rotated, vertical_detection) =
        extract_lines(&rotated, axis_size, Direction::Horizontal, params);
    let vertical_image = imageops::rotate270(&vertical_rotated);
    let vertical = match vertical_detection {
        SegmentDetection::NonePossible => SegmentDetection::NonePossible,
        SegmentDetection::Found(segments) => SegmentDetection::Found(
            segments
                .iter()
                .map(|seg| to_region_frame(seg, region.height()))
                .collect(),
        ),
    };

    EdgeScan {
        combined: blend(&horizontal_image, &vertical_image),
        horizontal,
        vertical,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_params() -> TransformParams {
        TransformParams {
            angle_resolution: 1.0,
            vote_threshold: 8,
            min_line_length: 10.0,
            max_line_gap: 2.0,
        }
    }

    /// 30x20 region with a horizontal line on row 9, x in [2, 28).
    fn horizontal_region() -> GrayImage {
        GrayImage::from_fn(30, 20, |x, y| {
            if y == 9 && (2..28).contains(&x) {
                image::Luma([255])
            } else {
                image::Luma([0])
            }
        })
    }

    /// 30x20 region with a vertical line at column 7, y in [2, 18).
    fn vertical_region() -> GrayImage {
        GrayImage::from_fn(30, 20, |x, y| {
            if x == 7 && (2..18).contains(&y) {
                image::Luma([255])
            } else {
                image::Luma([0])
            }
        })
    }

    #[test]
    fn combined_dimensions_match_region() {
        let scan = scan_edges(&horizontal_region(), 4, &test_params());
        assert_eq!(scan.combined.dimensions(), (30, 20));
    }

    #[test]
    fn horizontal_edges_attributed_to_horizontal_pass() {
        let scan = scan_edges(&horizontal_region(), 4, &test_params());
        assert!(scan.horizontal.count() >= 1, "got {:?}", scan.horizontal);
        assert_eq!(scan.vertical.count(), 0, "got {:?}", scan.vertical);
        // The blend must keep the horizontal contribution detectable.
        let lit = (2..28).filter(|&x| scan.combined.get_pixel(x, 9).0[0] > 0).count();
        assert!(lit >= 20, "blend erased the horizontal edge, lit {lit}");
    }

    #[test]
    fn vertical_edges_attributed_to_vertical_pass() {
        let scan = scan_edges(&vertical_region(), 4, &test_params());
        assert_eq!(scan.horizontal.count(), 0, "got {:?}", scan.horizontal);
        assert!(scan.vertical.count() >= 1, "got {:?}", scan.vertical);
        // Mapped back to region coordinates: the segment lies on x = 7.
        let seg = &scan.vertical.segments().unwrap()[0];
        assert!((seg.start.x - 7.0).abs() <= 1.0, "got {seg:?}");
        assert!((seg.end.x - 7.0).abs() <= 1.0, "got {seg:?}");
        assert!(seg.start.y < seg.end.y);
        // And the blend keeps it detectable.
        let lit = (2..18).filter(|&y| scan.combined.get_pixel(7, y).0[0] > 0).count();
        assert!(lit >= 12, "blend erased the vertical edge, lit {lit}");
    }

    #[test]
    fn both_passes_survive_blending() {
        // Cross: one horizontal and one vertical line in the same region.
        let region = GrayImage::from_fn(30, 20, |x, y| {
            if (y == 9 && (2..28).contains(&x)) || (x == 7 && (2..18).contains(&y)) {
                image::Luma([255])
            } else {
                image::Luma([0])
            }
        });
        let scan = scan_edges(&region, 4, &test_params());
        assert!(scan.horizontal.count() >= 1);
        assert!(scan.vertical.count() >= 1);
        assert!(scan.combined.get_pixel(20, 9).0[0] > 0);
        assert!(scan.combined.get_pixel(7, 15).0[0] > 0);
    }

    #[test]
    fn oversized_axis_propagates_none_possible() {
        let scan = scan_edges(&horizontal_region(), 21, &test_params());
        // 20 rows / axis 21 floors to zero for the horizontal pass.
        assert_eq!(scan.horizontal, SegmentDetection::NonePossible);
    }

    #[test]
    fn zero_height_region_scans_without_panicking() {
        let empty = GrayImage::new(30, 0);
        let scan = scan_edges(&empty, 4, &test_params());
        assert_eq!(scan.combined.dimensions(), (30, 0));
        assert_eq!(scan.horizontal, SegmentDetection::NonePossible);
        assert_eq!(scan.vertical.count(), 0);
    }

    #[test]
    fn rotated_frame_mapping_round_trips() {
        // A segment along column 5 of a 30x20 region, seen in the
        // rotated frame as row 5: (2, 5)-(17, 5) maps back to
        // (5, 2)-(5, 17).
        let rotated_seg = LineSegment::new(2.0, 5.0, 17.0, 5.0);
        let mapped = to_region_frame(&rotated_seg, 20);
        assert!((mapped.start.x - 5.0).abs() < 1e-10);
        assert!((mapped.start.y - 2.0).abs() < 1e-10);
        assert!((mapped.end.x - 5.0).abs() < 1e-10);
        assert!((mapped.end.y - 17.0).abs() < 1e-10);
    }

    #[test]
    fn scan_is_deterministic() {
        let region = vertical_region();
        let first = scan_edges(&region, 4, &test_params());
        let second = scan_edges(&region, 4, &test_params());
        assert_eq!(first.combined, second.combined);
        assert_eq!(first.horizontal, second.horizontal);
        assert_eq!(first.vertical, second.vertical);
    }
}
