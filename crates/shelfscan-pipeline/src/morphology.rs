//! Directional grayscale morphology with 1×N / N×1 rectangular kernels.
//!
//! The line extractor suppresses structures shorter than the kernel
//! along one axis by *opening* the image: erosion followed by dilation
//! with the same kernel. `imageproc`'s distance-based morphology only
//! offers square/diamond neighborhoods, so the rectangular kernels are
//! implemented here as separable sliding-window min/max filters.
//!
//! Out-of-bounds kernel taps are ignored (the window is clamped to the
//! image), matching OpenCV's default border handling for morphology.

use std::collections::VecDeque;

use image::GrayImage;

use crate::types::Direction;

/// Sliding-window minimum or maximum over one scan line.
///
/// The window for output index `i` spans `[i - anchor, i + length - 1 - anchor]`
/// clamped to the line, with `anchor = length / 2` (the kernel center,
/// as OpenCV anchors it). The max filter reflects the kernel around the
/// anchor, as dilation requires — for even lengths this keeps
/// erode-then-dilate anti-extensive. Uses a monotonic deque so the cost
/// is O(n) regardless of kernel length; shelf-scale kernels run to
/// hundreds of pixels, where a naive rescan per pixel is noticeably slow.
fn filter_line(values: &[u8], length: usize, maximum: bool) -> Vec<u8> {
    let n = values.len();
    let anchor = if maximum { (length - 1) / 2 } else { length / 2 };
    let lead = length - 1 - anchor;
    let mut out = vec![0u8; n];
    let mut window: VecDeque<usize> = VecDeque::new();
    let mut next = 0usize;

    for (i, slot) in out.iter_mut().enumerate() {
        // Admit candidates up to the right edge of window i.
        while next < n && next <= i + lead {
            while let Some(&back) = window.back() {
                let dominated = if maximum {
                    values[next] >= values[back]
                } else {
                    values[next] <= values[back]
                };
                if dominated {
                    window.pop_back();
                } else {
                    break;
                }
            }
            window.push_back(next);
            next += 1;
        }

        // Evict candidates left of the window.
        let lo = i.saturating_sub(anchor);
        while window.front().is_some_and(|&front| front < lo) {
            window.pop_front();
        }

        // The window always contains i itself, so front is never empty.
        *slot = window.front().map_or(values[i], |&j| values[j]);
    }

    out
}

/// Apply a 1-D min/max filter along the kernel axis of every scan line.
fn filter_image(image: &GrayImage, length: u32, direction: Direction, maximum: bool) -> GrayImage {
    // A kernel of length 0 or 1 is the identity.
    if length <= 1 {
        return image.clone();
    }

    let (width, height) = image.dimensions();
    let length = length as usize;
    let mut out = GrayImage::new(width, height);

    match direction {
        // Horizontal structures: kernel runs along x, one row at a time.
        Direction::Horizontal => {
            for y in 0..height {
                let row: Vec<u8> = (0..width).map(|x| image.get_pixel(x, y).0[0]).collect();
                for (x, value) in filter_line(&row, length, maximum).into_iter().enumerate() {
                    #[allow(clippy::cast_possible_truncation)]
                    out.put_pixel(x as u32, y, image::Luma([value]));
                }
            }
        }
        // Vertical structures: kernel runs along y, one column at a time.
        Direction::Vertical => {
            for x in 0..width {
                let column: Vec<u8> = (0..height).map(|y| image.get_pixel(x, y).0[0]).collect();
                for (y, value) in filter_line(&column, length, maximum)
                    .into_iter()
                    .enumerate()
                {
                    #[allow(clippy::cast_possible_truncation)]
                    out.put_pixel(x, y as u32, image::Luma([value]));
                }
            }
        }
    }

    out
}

/// Erode with a 1×N (`Horizontal`) or N×1 (`Vertical`) kernel.
#[must_use = "returns the eroded image"]
pub fn erode(image: &GrayImage, length: u32, direction: Direction) -> GrayImage {
    filter_image(image, length, direction, false)
}

/// Dilate with a 1×N (`Horizontal`) or N×1 (`Vertical`) kernel.
#[must_use = "returns the dilated image"]
pub fn dilate(image: &GrayImage, length: u32, direction: Direction) -> GrayImage {
    filter_image(image, length, direction, true)
}

/// Morphological opening: erode then dilate with the same kernel.
///
/// Removes bright structures shorter than `length` along the kernel
/// axis while preserving longer ones.
#[must_use = "returns the opened image"]
pub fn open(image: &GrayImage, length: u32, direction: Direction) -> GrayImage {
    let eroded = erode(image, length, direction);
    dilate(&eroded, length, direction)
}
