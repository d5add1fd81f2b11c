//! Integration test: run synthetic bookshelf images through the full pipeline.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use shelfscan_pipeline::{GrayImage, ShelfConfig, TransformParams};

/// Parameters scaled to the 360x270 synthetic fixtures.
fn fixture_config() -> ShelfConfig {
    ShelfConfig {
        shelf_axis_size: 9,
        spine_axis_size: 6,
        band_gap: 40.0,
        transform: TransformParams {
            angle_resolution: 1.0,
            vote_threshold: 15,
            min_line_length: 120.0,
            max_line_gap: 6.0,
        },
    }
}

/// A 360x270 bookshelf: two full-width shelf lines at the given slope,
/// with vertical spine strokes between them.
///
/// `slope` is dy/dx; 0.0 draws a level shelf.
fn bookshelf(slope: f64) -> GrayImage {
    GrayImage::from_fn(360, 270, |x, y| {
        let shelf = (5..355).contains(&x)
            && [89.0, 179.0].iter().any(|base| {
                let line_y = slope.mul_add(f64::from(x), *base);
                (f64::from(y) - line_y).abs() <= 1.0
            });
        let spine = [60u32, 150, 240, 300].contains(&x)
            && ((20..80).contains(&y) || (110..170).contains(&y));
        if shelf || spine {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    })
}

#[test]
fn level_bookshelf_end_to_end() {
    let image = bookshelf(0.0);
    let analysis =
        shelfscan_pipeline::analyze(&image, &fixture_config(), None).expect("pipeline should run");

    eprintln!(
        "level shelf: rotation {:?}, bands {:?}, {} regions",
        analysis.rotation_degrees,
        analysis.bands,
        analysis.regions.len(),
    );

    let rotation = analysis.rotation_degrees.expect("shelf lines were detected");
    assert!(rotation.abs() < 1.0, "level shelf, got {rotation}");

    assert_eq!(analysis.bands.len(), 2, "bands {:?}", analysis.bands);
    assert!((analysis.bands[0] - 89.0).abs() <= 2.0, "bands {:?}", analysis.bands);
    assert!((analysis.bands[1] - 179.0).abs() <= 2.0, "bands {:?}", analysis.bands);

    // Regions partition the image: n+1 full-width strips covering every row.
    assert_eq!(analysis.regions.len(), 3);
    assert_eq!(analysis.scans.len(), 3);
    let total: u32 = analysis.regions.iter().map(GrayImage::height).sum();
    assert_eq!(total, 270);
    assert!(analysis.regions.iter().all(|r| r.width() == 360));

    let vertical_segments: usize = analysis.scans.iter().map(|s| s.vertical.count()).sum();
    eprintln!("level shelf: {vertical_segments} vertical segments across regions");
}

#[test]
fn tilted_bookshelf_is_leveled_before_banding() {
    // Slope 0.05 is a tilt of about 2.9 degrees.
    let image = bookshelf(0.05);
    let analysis =
        shelfscan_pipeline::analyze(&image, &fixture_config(), None).expect("pipeline should run");

    eprintln!(
        "tilted shelf: rotation {:?}, bands {:?}",
        analysis.rotation_degrees, analysis.bands,
    );

    let rotation = analysis.rotation_degrees.expect("shelf lines were detected");
    assert!(
        (rotation - 2.86).abs() < 1.5,
        "expected ~2.9 degree estimate, got {rotation}",
    );

    // Banding runs in the rotated frame, so the two shelves still
    // separate cleanly into two bands and three regions.
    assert_eq!(analysis.bands.len(), 2, "bands {:?}", analysis.bands);
    assert_eq!(analysis.regions.len(), 3);
    let total: u32 = analysis.regions.iter().map(GrayImage::height).sum();
    assert_eq!(total, 270);
}

#[test]
fn analysis_is_idempotent_end_to_end() {
    let image = bookshelf(0.05);
    let config = fixture_config();
    let first = shelfscan_pipeline::analyze(&image, &config, None).unwrap();
    let second = shelfscan_pipeline::analyze(&image, &config, None).unwrap();

    assert_eq!(first.rotation_degrees, second.rotation_degrees);
    assert_eq!(first.rotated, second.rotated);
    assert_eq!(first.bands, second.bands);
    assert_eq!(first.regions, second.regions);
    for (a, b) in first.scans.iter().zip(&second.scans) {
        assert_eq!(a.combined, b.combined);
        assert_eq!(a.horizontal, b.horizontal);
        assert_eq!(a.vertical, b.vertical);
    }
}
