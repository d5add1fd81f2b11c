//! Shelf band clustering and region splitting.
//!
//! Shelf-boundary segments cluster naturally in y: both endpoints of
//! every segment on one shelf edge sit within a few pixels of each
//! other, while neighboring shelves are a book-height apart. Banding
//! sorts the flattened y-values and splits wherever the gap between
//! neighbors exceeds a threshold; each group's mean is one shelf band.
//! Consecutive bands then slice the image into per-shelf regions.

use image::GrayImage;
use image::imageops;

use crate::types::{LineSegment, PipelineError};

/// Cluster segment y-coordinates into ordered shelf-band centerlines.
///
/// Flattens both endpoint y-values of every segment, sorts ascending,
/// groups values whose gap to the previous value is at most `gap`, and
/// returns each group's arithmetic mean. An empty segment set produces
/// an empty sequence — the legitimate single-full-image-region case,
/// distinct from any error.
#[must_use]
pub fn band_y_values(segments: &[LineSegment], gap: f64) -> Vec<f64> {
    let mut ys: Vec<f64> = segments
        .iter()
        .flat_map(|seg| [seg.start.y, seg.end.y])
        .collect();
    ys.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut bands = Vec::new();
    let mut group: Vec<f64> = Vec::new();
    for y in ys {
        if let Some(&last) = group.last()
            && y - last > gap
        {
            #[allow(clippy::cast_precision_loss)]
            bands.push(group.iter().sum::<f64>() / group.len() as f64);
            group.clear();
        }
        group.push(y);
    }
    if !group.is_empty() {
        #[allow(clippy::cast_precision_loss)]
        bands.push(group.iter().sum::<f64>() / group.len() as f64);
    }

    bands
}

/// Convert a band value to the image row it cuts at.
///
/// Band values are truncated to integer rows. A non-finite value or one
/// outside `[0, height]` cannot index a row; that is fatal for the whole
/// run — the caller gets no partial region list.
fn band_row(band: f64, height: u32) -> Result<u32, PipelineError> {
    if !band.is_finite() || band < 0.0 || band > f64::from(height) {
        return Err(PipelineError::BandOutOfRange { band, height });
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let row = band.trunc() as u32;
    Ok(row.min(height))
}

/// Slice an image into per-shelf regions at the given band rows.
///
/// With no bands the whole image is the single region. Otherwise the
/// result has `bands.len() + 1` full-width strips: top edge to the
/// first band, each band to the next, and the last band to the bottom
/// edge. Strips are contiguous and non-overlapping; their row ranges
/// partition `[0, height)` exactly, so every row belongs to exactly one
/// region (a band at row 0 or `height` yields an empty strip rather
/// than breaking the partition).
///
/// # Errors
///
/// [`PipelineError::BandOutOfRange`] if any band value cannot be
/// converted to a valid row; [`PipelineError::BandsUnordered`] if the
/// band sequence is not ascending. Both abort without returning partial
/// regions.
pub fn split_regions(
    image: &GrayImage,
    bands: &[f64],
) -> Result<Vec<GrayImage>, PipelineError> {
    let (width, height) = image.dimensions();
    if bands.is_empty() {
        return Ok(vec![image.clone()]);
    }

    // Validate every cut before touching the image: no partial output.
    let mut rows = Vec::with_capacity(bands.len() + 2);
    rows.push(0);
    for &band in bands {
        rows.push(band_row(band, height)?);
    }
    rows.push(height);
    if rows.windows(2).any(|pair| pair[0] > pair[1]) {
        return Err(PipelineError::BandsUnordered);
    }

    Ok(rows
        .windows(2)
        .map(|pair| imageops::crop_imm(image, 0, pair[0], width, pair[1] - pair[0]).to_image())
        .collect())
}
