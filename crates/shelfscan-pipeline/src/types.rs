//! Shared types for the shelfscan geometric segmentation pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference raster
/// data without depending on `image` directly.
pub use image::GrayImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// An ordered pair of endpoints in image-pixel coordinates.
///
/// Produced only by the probabilistic line-segment transform
/// ([`crate::hough::detect_segments`]), which orders endpoints
/// left-to-right (ties top-to-bottom) so that [`Self::angle_degrees`]
/// falls in (-90, 90].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    /// First endpoint.
    pub start: Point,
    /// Second endpoint.
    pub end: Point,
}

impl LineSegment {
    /// Create a segment from endpoint coordinates.
    #[must_use]
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            start: Point::new(x1, y1),
            end: Point::new(x2, y2),
        }
    }

    /// Segment angle in degrees, computed as `atan2(y2 - y1, x2 - x1)`.
    ///
    /// Range is (-180, 180]; a perfectly horizontal left-to-right
    /// segment is 0.
    #[must_use]
    pub fn angle_degrees(&self) -> f64 {
        (self.end.y - self.start.y)
            .atan2(self.end.x - self.start.x)
            .to_degrees()
    }

    /// Euclidean length in pixels.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

/// Which image dimension a line scan runs along.
///
/// Selects the structuring-element orientation in
/// [`crate::lines::extract_lines`]: `Horizontal` searches for long runs
/// along the x axis (sized by image height), `Vertical` along the y axis
/// (sized by image width).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Retain long horizontal structures (shelf boundaries).
    Horizontal,
    /// Retain long vertical structures (book-spine edges).
    Vertical,
}

/// Outcome of one line-detection run.
///
/// Distinguishes "detection could not run" from "detection ran and found
/// nothing". The two coincide in their single-region fallback today, but
/// downstream counting code must be able to tell them apart, so the
/// degenerate state is a variant rather than an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SegmentDetection {
    /// The structuring element degenerated to zero length (axis size
    /// exceeds the scanned dimension, or is zero); no lines are possible.
    NonePossible,
    /// The transform ran; zero or more segments were found.
    Found(Vec<LineSegment>),
}

impl SegmentDetection {
    /// The detected segments, or `None` when detection was impossible.
    #[must_use]
    pub fn segments(&self) -> Option<&[LineSegment]> {
        match self {
            Self::NonePossible => None,
            Self::Found(segments) => Some(segments),
        }
    }

    /// Number of detected segments (zero when detection was impossible).
    #[must_use]
    pub fn count(&self) -> usize {
        self.segments().map_or(0, <[LineSegment]>::len)
    }

    /// Whether detection ran at all.
    #[must_use]
    pub const fn is_possible(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Parameters of the probabilistic line-segment transform.
///
/// The values are resolution- and scale-dependent (the defaults assume
/// photographs of a few thousand pixels per side), so they are an
/// explicit configuration surface rather than constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformParams {
    /// Accumulator angle resolution in degrees.
    pub angle_resolution: f64,

    /// Minimum accumulator votes before a candidate line is walked.
    pub vote_threshold: u32,

    /// Minimum Euclidean segment length in pixels. Shorter walks are
    /// discarded (their pixels are still consumed).
    pub min_line_length: f64,

    /// Maximum run of empty pixels tolerated before a corridor walk
    /// terminates.
    pub max_line_gap: f64,
}

impl TransformParams {
    /// Default accumulator angle resolution (degrees).
    pub const DEFAULT_ANGLE_RESOLUTION: f64 = 1.0;
    /// Default accumulator vote threshold.
    pub const DEFAULT_VOTE_THRESHOLD: u32 = 15;
    /// Default minimum segment length (pixels).
    pub const DEFAULT_MIN_LINE_LENGTH: f64 = 900.0;
    /// Default maximum in-segment gap (pixels).
    pub const DEFAULT_MAX_LINE_GAP: f64 = 500.0;
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            angle_resolution: Self::DEFAULT_ANGLE_RESOLUTION,
            vote_threshold: Self::DEFAULT_VOTE_THRESHOLD,
            min_line_length: Self::DEFAULT_MIN_LINE_LENGTH,
            max_line_gap: Self::DEFAULT_MAX_LINE_GAP,
        }
    }
}

/// Configuration for the full shelf segmentation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfConfig {
    /// Axis size for the shelf-scale scan. The structuring-element
    /// length is `image_height / shelf_axis_size`, so smaller values
    /// demand longer (more shelf-like) structures.
    pub shelf_axis_size: u32,

    /// Axis size for the per-region spine-scale scan.
    pub spine_axis_size: u32,

    /// Maximum gap in pixels between neighboring sorted y-values that
    /// still belong to the same shelf band. Assumes shelf-to-shelf
    /// spacing is large relative to line-thickness jitter.
    pub band_gap: f64,

    /// Line-segment transform parameters shared by all scans.
    pub transform: TransformParams,
}

impl ShelfConfig {
    /// Default shelf-scale axis size.
    pub const DEFAULT_SHELF_AXIS_SIZE: u32 = 15;
    /// Default spine-scale axis size.
    pub const DEFAULT_SPINE_AXIS_SIZE: u32 = 40;
    /// Default band clustering gap (pixels).
    pub const DEFAULT_BAND_GAP: f64 = 100.0;
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            shelf_axis_size: Self::DEFAULT_SHELF_AXIS_SIZE,
            spine_axis_size: Self::DEFAULT_SPINE_AXIS_SIZE,
            band_gap: Self::DEFAULT_BAND_GAP,
            transform: TransformParams::default(),
        }
    }
}

/// Output of one per-region edge scan.
///
/// Keeps the raw segment sets from both passes alongside the blended
/// image: downstream boundary-to-spine assignment needs the segments,
/// not just the composite raster. Vertical-pass segments are reported
/// in region coordinates (mapped back through the 90° rotation).
#[derive(Debug, Clone)]
pub struct EdgeScan {
    /// Equal-weighted blend of the horizontal- and vertical-pass edge
    /// images.
    pub combined: GrayImage,
    /// Horizontal-pass detection (shelf-parallel edges).
    pub horizontal: SegmentDetection,
    /// Vertical-pass detection (spine edges), in region coordinates.
    pub vertical: SegmentDetection,
}

/// Result of running the full segmentation pipeline.
///
/// Every intermediate a human-in-the-loop display or a downstream spine
/// segmenter needs: the rotation diagnostic, the filtered line image,
/// the rotated raster, the band list, and the per-region edge scans.
///
/// Does not derive `PartialEq`; idempotence tests compare the fields
/// individually.
#[derive(Debug, Clone)]
pub struct ShelfAnalysis {
    /// Median shelf-line angle in degrees, `None` when no lines were
    /// available to estimate from. The applied correction is the
    /// negation of this value.
    pub rotation_degrees: Option<f64>,

    /// Shelf-scale line-structure image (pre-rotation), for display.
    pub shelf_lines: GrayImage,

    /// Shelf-boundary detection on the rotated image; the source of the
    /// band values.
    pub shelf_detection: SegmentDetection,

    /// The binary input after rotation correction. Equal to the input
    /// when no correction was applied.
    pub rotated: GrayImage,

    /// Ordered shelf-band centerlines (rows of `rotated`).
    pub bands: Vec<f64>,

    /// Per-shelf regions slicing `rotated` top to bottom.
    pub regions: Vec<GrayImage>,

    /// One edge scan per region, in region order.
    pub scans: Vec<EdgeScan>,
}

/// Errors that can occur during pipeline processing.
///
/// Degenerate-but-legitimate states (no lines possible, zero bands) are
/// not errors; they flow through [`SegmentDetection`] and empty band
/// lists. These variants are the fatal-to-run conditions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// A shelf-band value cannot be converted to a valid image row.
    /// Fatal for the whole run; no partial regions are returned.
    #[error("shelf band {band} does not index a row of a {height}-row image")]
    BandOutOfRange {
        /// The offending band value.
        band: f64,
        /// Height of the image being split.
        height: u32,
    },

    /// Band values reached the region splitter out of ascending order.
    #[error("shelf bands are not in ascending order")]
    BandsUnordered,

    /// The interactive confirmation collaborator declined the result.
    #[error("user rejected the detection result")]
    ConfirmationRejected,
}
