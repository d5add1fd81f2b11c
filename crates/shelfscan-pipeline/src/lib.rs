//! shelfscan-pipeline: Pure bookshelf segmentation pipeline (sans-IO).
//!
//! Turns a binary photograph of a bookshelf into per-shelf regions and
//! candidate book-edge maps through:
//! directional opening -> line-segment transform -> rotation correction ->
//! shelf banding -> region splitting -> per-region edge scanning.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! [`GrayImage`] values and returns structured data. Decoding,
//! thresholding, terminal interaction, and file output live in the
//! `shelfscan` CLI crate.

pub mod bands;
pub mod confirm;
pub mod edges;
pub mod hough;
pub mod lines;
pub mod morphology;
pub mod rotation;
pub mod types;

pub use confirm::{AutoConfirm, Checkpoint, Confirm, Confirmation};
pub use types::{
    Direction, EdgeScan, GrayImage, LineSegment, PipelineError, Point, SegmentDetection,
    ShelfAnalysis, ShelfConfig, TransformParams,
};

/// Reject numeric configuration the pipeline cannot run with.
fn validate(config: &ShelfConfig) -> Result<(), PipelineError> {
    let params = &config.transform;
    if !params.angle_resolution.is_finite()
        || params.angle_resolution < hough::MIN_ANGLE_RESOLUTION
    {
        return Err(PipelineError::InvalidConfig(format!(
            "angle resolution {} is below the minimum of {}",
            params.angle_resolution,
            hough::MIN_ANGLE_RESOLUTION,
        )));
    }
    if !params.min_line_length.is_finite() || params.min_line_length < 0.0 {
        return Err(PipelineError::InvalidConfig(format!(
            "minimum line length {} must be a non-negative number",
            params.min_line_length,
        )));
    }
    if !params.max_line_gap.is_finite() || params.max_line_gap < 0.0 {
        return Err(PipelineError::InvalidConfig(format!(
            "maximum line gap {} must be a non-negative number",
            params.max_line_gap,
        )));
    }
    if !config.band_gap.is_finite() || config.band_gap < 0.0 {
        return Err(PipelineError::InvalidConfig(format!(
            "band gap {} must be a non-negative number",
            config.band_gap,
        )));
    }
    Ok(())
}

/// Run the full shelf segmentation pipeline.
///
/// Takes an already-binarized grayscale image (foreground bright on a
/// dark background) and a configuration, then produces a
/// [`ShelfAnalysis`] with the rotation diagnostic, shelf bands,
/// per-shelf regions, and per-region edge scans.
///
/// When a [`Confirm`] collaborator is supplied the pipeline pauses at
/// each checkpoint: [`Confirmation::Adjusted`] re-runs that extraction
/// at the new axis size and asks again, [`Confirmation::Rejected`]
/// aborts the run. Passing `None` behaves like [`AutoConfirm`]. The
/// collaborator call may block indefinitely; everything else here is
/// synchronous and deterministic, so identical inputs yield identical
/// analyses.
///
/// # Pipeline steps
///
/// 1. Shelf-scale horizontal line extraction (confirmation checkpoint)
/// 2. Rotation estimate from the detected lines; rotate by the negated
///    angle (skipped when the estimate is undefined or zero)
/// 3. Re-extraction of shelf lines in the rotated frame
/// 4. Band clustering and region splitting
/// 5. Per-region edge scan at spine scale (confirmation checkpoint)
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for malformed numeric
/// configuration, [`PipelineError::ConfirmationRejected`] when the
/// collaborator declines a checkpoint, and the band errors
/// ([`PipelineError::BandOutOfRange`], [`PipelineError::BandsUnordered`])
/// when clustering produces rows the splitter cannot cut at.
pub fn analyze(
    binary: &GrayImage,
    config: &ShelfConfig,
    confirm: Option<&dyn Confirm>,
) -> Result<ShelfAnalysis, PipelineError> {
    validate(config)?;

    // 1. Shelf-scale horizontal extraction, re-run on adjustment.
    let mut shelf_axis = config.shelf_axis_size;
    let (mut shelf_lines, mut detection) =
        lines::extract_lines(binary, shelf_axis, Direction::Horizontal, &config.transform);
    if let Some(confirm) = confirm {
        loop {
            match confirm.confirm(Checkpoint::ShelfLines, &shelf_lines, shelf_axis) {
                Confirmation::Accepted => break,
                Confirmation::Adjusted(axis) => {
                    shelf_axis = axis;
                    (shelf_lines, detection) = lines::extract_lines(
                        binary,
                        shelf_axis,
                        Direction::Horizontal,
                        &config.transform,
                    );
                }
                Confirmation::Rejected => return Err(PipelineError::ConfirmationRejected),
            }
        }
    }

    // 2. Rotation correction by the negated median angle.
    let rotation_degrees = rotation::estimate(&detection);
    let rotated = match rotation_degrees {
        Some(angle) if angle != 0.0 => rotation::rotate_by(binary, -angle),
        _ => binary.clone(),
    };

    // 3. Shelf lines again, in the rotated frame; band rows must index
    //    the image they will cut.
    let (_, shelf_detection) =
        lines::extract_lines(&rotated, shelf_axis, Direction::Horizontal, &config.transform);

    // 4. Band clustering and region splitting.
    let bands = bands::band_y_values(
        shelf_detection.segments().unwrap_or(&[]),
        config.band_gap,
    );
    let regions = bands::split_regions(&rotated, &bands)?;

    // 5. Per-region edge scan, re-run on adjustment.
    let mut scans = Vec::with_capacity(regions.len());
    for (index, region) in regions.iter().enumerate() {
        let mut spine_axis = config.spine_axis_size;
        let mut scan = edges::scan_edges(region, spine_axis, &config.transform);
        if let Some(confirm) = confirm {
            loop {
                match confirm.confirm(Checkpoint::RegionEdges(index), &scan.combined, spine_axis) {
                    Confirmation::Accepted => break,
                    Confirmation::Adjusted(axis) => {
                        spine_axis = axis;
                        scan = edges::scan_edges(region, spine_axis, &config.transform);
                    }
                    Confirmation::Rejected => return Err(PipelineError::ConfirmationRejected),
                }
            }
        }
        scans.push(scan);
    }

    Ok(ShelfAnalysis {
        rotation_degrees,
        shelf_lines,
        shelf_detection,
        rotated,
        bands,
        regions,
        scans,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// 120x90 bookshelf: full-width shelf lines on rows 29 and 59, a
    /// few vertical spine strokes between them.
    fn bookshelf() -> GrayImage {
        GrayImage::from_fn(120, 90, |x, y| {
            let shelf = (y == 29 || y == 59) && (2..118).contains(&x);
            let spine = (x == 30 || x == 70) && ((5..25).contains(&y) || (35..55).contains(&y));
            if shelf || spine {
                image::Luma([255])
            } else {
                image::Luma([0])
            }
        })
    }

    /// Parameters scaled down for the small synthetic fixture.
    fn test_config() -> ShelfConfig {
        ShelfConfig {
            shelf_axis_size: 9,
            spine_axis_size: 6,
            band_gap: 15.0,
            transform: TransformParams {
                angle_resolution: 1.0,
                vote_threshold: 10,
                min_line_length: 40.0,
                max_line_gap: 4.0,
            },
        }
    }

    #[test]
    fn level_bookshelf_splits_into_three_regions() {
        let analysis = analyze(&bookshelf(), &test_config(), None).unwrap();

        // Both shelf lines are horizontal, so the estimate is zero and
        // the image passes through unrotated.
        assert!(analysis.rotation_degrees.unwrap().abs() < 1.0);
        assert_eq!(analysis.rotated, bookshelf());

        assert_eq!(analysis.bands.len(), 2);
        assert!((analysis.bands[0] - 29.0).abs() <= 1.0, "got {:?}", analysis.bands);
        assert!((analysis.bands[1] - 59.0).abs() <= 1.0, "got {:?}", analysis.bands);

        assert_eq!(analysis.regions.len(), 3);
        assert_eq!(analysis.scans.len(), 3);
        let total: u32 = analysis.regions.iter().map(GrayImage::height).sum();
        assert_eq!(total, 90);
        assert!(analysis.regions.iter().all(|r| r.width() == 120));
    }

    #[test]
    fn blank_image_yields_single_region() {
        let blank = GrayImage::new(120, 90);
        let analysis = analyze(&blank, &test_config(), None).unwrap();
        assert_eq!(analysis.rotation_degrees, None);
        assert!(analysis.bands.is_empty());
        assert_eq!(analysis.regions.len(), 1);
        assert_eq!(analysis.regions[0], blank);
        assert_eq!(analysis.scans.len(), 1);
    }

    #[test]
    fn analysis_is_idempotent() {
        let img = bookshelf();
        let config = test_config();
        let first = analyze(&img, &config, None).unwrap();
        let second = analyze(&img, &config, None).unwrap();
        assert_eq!(first.rotation_degrees, second.rotation_degrees);
        assert_eq!(first.shelf_lines, second.shelf_lines);
        assert_eq!(first.shelf_detection, second.shelf_detection);
        assert_eq!(first.rotated, second.rotated);
        assert_eq!(first.bands, second.bands);
        assert_eq!(first.regions, second.regions);
        for (a, b) in first.scans.iter().zip(&second.scans) {
            assert_eq!(a.combined, b.combined);
            assert_eq!(a.horizontal, b.horizontal);
            assert_eq!(a.vertical, b.vertical);
        }
    }

    struct RejectAll;

    impl Confirm for RejectAll {
        fn confirm(&self, _: Checkpoint, _: &GrayImage, _: u32) -> Confirmation {
            Confirmation::Rejected
        }
    }

    #[test]
    fn rejection_aborts_the_run() {
        let result = analyze(&bookshelf(), &test_config(), Some(&RejectAll));
        assert!(matches!(result, Err(PipelineError::ConfirmationRejected)));
    }

    /// Adjusts the shelf axis once, then accepts everything.
    struct AdjustShelfOnce {
        to: u32,
        done: Cell<bool>,
    }

    impl Confirm for AdjustShelfOnce {
        fn confirm(&self, checkpoint: Checkpoint, _: &GrayImage, _: u32) -> Confirmation {
            if checkpoint == Checkpoint::ShelfLines && !self.done.get() {
                self.done.set(true);
                return Confirmation::Adjusted(self.to);
            }
            Confirmation::Accepted
        }
    }

    #[test]
    fn adjustment_reruns_at_the_new_axis() {
        let img = bookshelf();
        let config = test_config();
        let adjuster = AdjustShelfOnce {
            to: 5,
            done: Cell::new(false),
        };
        let adjusted = analyze(&img, &config, Some(&adjuster)).unwrap();

        // The result must match a run configured with the new axis size
        // from the start.
        let direct_config = ShelfConfig {
            shelf_axis_size: 5,
            ..config
        };
        let direct = analyze(&img, &direct_config, None).unwrap();
        assert_eq!(adjusted.shelf_lines, direct.shelf_lines);
        assert_eq!(adjusted.bands, direct.bands);
    }

    #[test]
    fn auto_confirm_matches_no_collaborator() {
        let img = bookshelf();
        let config = test_config();
        let auto = analyze(&img, &config, Some(&AutoConfirm)).unwrap();
        let none = analyze(&img, &config, None).unwrap();
        assert_eq!(auto.bands, none.bands);
        assert_eq!(auto.regions, none.regions);
    }

    #[test]
    fn malformed_config_is_rejected_up_front() {
        let img = GrayImage::new(8, 8);
        for config in [
            ShelfConfig {
                band_gap: -1.0,
                ..test_config()
            },
            ShelfConfig {
                transform: TransformParams {
                    angle_resolution: 0.0,
                    ..test_config().transform
                },
                ..test_config()
            },
            ShelfConfig {
                transform: TransformParams {
                    min_line_length: f64::NAN,
                    ..test_config().transform
                },
                ..test_config()
            },
        ] {
            let result = analyze(&img, &config, None);
            assert!(
                matches!(result, Err(PipelineError::InvalidConfig(_))),
                "config {config:?} should be rejected",
            );
        }
    }
}
