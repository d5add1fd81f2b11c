//! Probabilistic line-segment transform.
//!
//! Detects finite line segments (endpoint pairs, not infinite lines) in
//! a binary image, in the manner of OpenCV's `HoughLinesP`: every
//! feature pixel votes into a (θ, ρ) accumulator; once a pixel's best
//! bin reaches the vote threshold, the corresponding line is walked
//! through the image with a bounded gap tolerance, and a sufficiently
//! long run is emitted as a segment. Pixels consumed by a walk are
//! removed from the image and their votes retracted, so each feature
//! pixel supports at most one segment.
//!
//! One deliberate departure from OpenCV: seed pixels are visited in
//! deterministic row-major order instead of being sampled randomly.
//! The detected segment set is part of this pipeline's contract
//! (identical inputs must yield identical bands and regions), and
//! random sampling would break that. Random sampling is also what lets
//! OpenCV trust the single best accumulator bin: spread-out votes
//! separate near-parallel bins before the threshold triggers. With
//! scan-order seeding a trigger can arrive while only a short prefix of
//! a line has voted and many bins are still tied, so ties are resolved
//! by walking every tied corridor and keeping the one that covers the
//! most feature pixels.

use image::GrayImage;

use crate::types::{LineSegment, TransformParams};

/// Smallest accepted accumulator angle resolution, in degrees.
///
/// A resolution of zero (or below) would make the accumulator
/// infinitely wide; values this small are already far below any useful
/// precision for shelf photographs.
pub const MIN_ANGLE_RESOLUTION: f64 = 0.1;

/// Accumulator geometry plus the vote bookkeeping for one detection run.
struct Accumulator {
    /// (cos θ, sin θ) per angle bin, θ ∈ [0°, 180°).
    trig: Vec<(f64, f64)>,
    /// ρ offset: bin index = round(ρ) + offset.
    rho_offset: i64,
    /// Bins per angle.
    n_rho: usize,
    /// Votes, indexed `[theta * n_rho + rho]`.
    votes: Vec<i32>,
}

impl Accumulator {
    fn new(width: u32, height: u32, angle_resolution: f64) -> Self {
        let step = angle_resolution.max(MIN_ANGLE_RESOLUTION);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n_theta = (180.0 / step).ceil() as usize;
        let trig: Vec<(f64, f64)> = (0..n_theta)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let theta = (i as f64 * step).to_radians();
                (theta.cos(), theta.sin())
            })
            .collect();

        let diagonal = f64::from(width).hypot(f64::from(height));
        #[allow(clippy::cast_possible_truncation)]
        let rho_offset = diagonal.ceil() as i64;
        #[allow(clippy::cast_sign_loss)]
        let n_rho = (2 * rho_offset + 1) as usize;

        Self {
            votes: vec![0; n_theta * n_rho],
            trig,
            rho_offset,
            n_rho,
        }
    }

    fn bin(&self, theta: usize, x: u32, y: u32) -> usize {
        let (cos_t, sin_t) = self.trig[theta];
        #[allow(clippy::cast_possible_truncation)]
        let rho = f64::from(x).mul_add(cos_t, f64::from(y) * sin_t).round() as i64;
        #[allow(clippy::cast_sign_loss)]
        let rho_idx = (rho + self.rho_offset) as usize;
        theta * self.n_rho + rho_idx
    }

    /// Vote for every angle bin; returns the highest vote count among
    /// the bins through (x, y).
    fn vote(&mut self, x: u32, y: u32) -> i32 {
        let mut best = 0;
        for theta in 0..self.trig.len() {
            let bin = self.bin(theta, x, y);
            self.votes[bin] += 1;
            best = best.max(self.votes[bin]);
        }
        best
    }

    /// Theta bins through (x, y) holding exactly `votes` votes.
    ///
    /// Over a short stretch of a line the ρ values of near-parallel
    /// angles round identically, so several bins reach the maximum
    /// together; the caller disambiguates by corridor coverage.
    fn tied_thetas(&self, x: u32, y: u32, votes: i32) -> Vec<usize> {
        (0..self.trig.len())
            .filter(|&theta| self.votes[self.bin(theta, x, y)] == votes)
            .collect()
    }

    fn retract(&mut self, x: u32, y: u32) {
        for theta in 0..self.trig.len() {
            let bin = self.bin(theta, x, y);
            self.votes[bin] -= 1;
        }
    }
}

/// Unit step along the line whose accumulator normal is (cos θ, sin θ),
/// scaled so the dominant component is ±1 (one pixel per step).
fn line_step(cos_t: f64, sin_t: f64) -> (f64, f64) {
    let (dx, dy) = (-sin_t, cos_t);
    if dx.abs() >= dy.abs() {
        (dx.signum(), dy / dx.abs())
    } else {
        (dx / dy.abs(), dy.signum())
    }
}

/// Walk the candidate line through the seed in both directions,
/// collecting the feature pixels that belong to it.
///
/// A walk direction terminates at the image border or after more than
/// `max_gap` consecutive empty pixels. Returns the collected pixels and
/// the farthest on-line pixel reached in each direction.
fn walk(
    mask: &[bool],
    width: u32,
    height: u32,
    seed: (u32, u32),
    step: (f64, f64),
    max_gap: f64,
) -> (Vec<(u32, u32)>, (u32, u32), (u32, u32)) {
    let mut pixels = vec![seed];
    let mut ends = [seed, seed];

    for (end, sign) in ends.iter_mut().zip([1.0, -1.0]) {
        let (mut fx, mut fy) = (f64::from(seed.0), f64::from(seed.1));
        let mut gap = 0.0;
        loop {
            fx += sign * step.0;
            fy += sign * step.1;
            let (xi, yi) = (fx.round(), fy.round());
            if xi < 0.0 || yi < 0.0 || xi >= f64::from(width) || yi >= f64::from(height) {
                break;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let (x, y) = (xi as u32, yi as u32);
            if mask[(y * width + x) as usize] {
                pixels.push((x, y));
                *end = (x, y);
                gap = 0.0;
            } else {
                gap += 1.0;
                if gap > max_gap {
                    break;
                }
            }
        }
    }

    (pixels, ends[0], ends[1])
}

/// Order a detected endpoint pair left-to-right (ties top-to-bottom),
/// so segment angles fall in (-90, 90].
fn oriented(a: (u32, u32), b: (u32, u32)) -> LineSegment {
    let (first, second) = if (a.0, a.1) <= (b.0, b.1) { (a, b) } else { (b, a) };
    LineSegment::new(
        f64::from(first.0),
        f64::from(first.1),
        f64::from(second.0),
        f64::from(second.1),
    )
}

/// Detect line segments in a binary image.
///
/// Pixels with value greater than zero are features. Returns zero or
/// more segments; the caller decides what an empty result means (this
/// function has no "detection impossible" state — that distinction
/// lives in [`crate::lines::extract_lines`]).
#[must_use = "returns the detected segments"]
pub fn detect_segments(image: &GrayImage, params: &TransformParams) -> Vec<LineSegment> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut acc = Accumulator::new(width, height, params.angle_resolution);
    let mut mask: Vec<bool> = image.pixels().map(|p| p.0[0] > 0).collect();
    let mut voted = vec![false; mask.len()];
    let min_length = params.min_line_length.max(0.0);
    let max_gap = params.max_line_gap.max(0.0);
    let vote_threshold = i32::try_from(params.vote_threshold).unwrap_or(i32::MAX);

    let mut segments = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            if !mask[idx] {
                continue;
            }

            let best_votes = acc.vote(x, y);
            voted[idx] = true;
            if best_votes < vote_threshold {
                continue;
            }

            // Walk every tied bin and keep the corridor covering the
            // most feature pixels; the tied set always contains the
            // bin that reached the maximum.
            let mut walked: Option<(Vec<(u32, u32)>, (u32, u32), (u32, u32))> = None;
            for theta in acc.tied_thetas(x, y, best_votes) {
                let (cos_t, sin_t) = acc.trig[theta];
                let candidate =
                    walk(&mask, width, height, (x, y), line_step(cos_t, sin_t), max_gap);
                if walked
                    .as_ref()
                    .is_none_or(|best| candidate.0.len() > best.0.len())
                {
                    walked = Some(candidate);
                }
            }
            let Some((pixels, far_a, far_b)) = walked else {
                continue;
            };

            let candidate = oriented(far_a, far_b);
            if candidate.length() >= min_length {
                segments.push(candidate);
            }

            // Consume the walked pixels either way: a too-short run
            // would otherwise re-trigger from every later seed on it.
            for (px, py) in pixels {
                let pidx = (py * width + px) as usize;
                if mask[pidx] {
                    mask[pidx] = false;
                    if voted[pidx] {
                        acc.retract(px, py);
                        voted[pidx] = false;
                    }
                }
            }
        }
    }

    segments
}
