//! Hand detection on RGB frames.
//!
//! The detector answers one question per frame: where is the hand, if
//! anywhere?  [`SkinDetector`] classifies pixels as skin in YCbCr space and
//! reports the centroid of the matches.
//!
//! # Algorithm
//!
//! For every `stride`-th pixel in both directions:
//!
//! * convert RGB → (Cb, Cr) with the BT.601 coefficients;
//! * count it as skin when `77 ≤ Cb ≤ 127` and `133 ≤ Cr ≤ 173`;
//! * accumulate its x and y.
//!
//! With at least `min_pixels` skin samples, the hand is at the integer mean
//! of their coordinates.

use fractal_tree::Point;
use image::{Rgb, RgbImage};

const CB_RANGE: (f32, f32) = (77.0, 127.0);
const CR_RANGE: (f32, f32) = (133.0, 173.0);

/// Anything that can locate a pointer in a frame.
pub trait PointerDetector {
    fn detect(&mut self, frame: &RgbImage) -> Option<Point>;
}

// ════════════════════════════════════════════════════════════════════════════
// SkinDetector
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkinDetector {
    pub min_pixels: usize,
    pub stride:     usize,
}

impl Default for SkinDetector {
    fn default() -> Self {
        SkinDetector { min_pixels: 400, stride: 2 }
    }
}

impl SkinDetector {
    pub fn new(min_pixels: usize, stride: usize) -> Self {
        SkinDetector { min_pixels, stride: stride.max(1) }
    }
}

impl PointerDetector for SkinDetector {
    fn detect(&mut self, frame: &RgbImage) -> Option<Point> {
        let step = self.stride.max(1);
        let (mut sum_x, mut sum_y, mut count) = (0u64, 0u64, 0u64);

        for y in (0..frame.height()).step_by(step) {
            for x in (0..frame.width()).step_by(step) {
                if is_skin(frame.get_pixel(x, y)) {
                    sum_x += x as u64;
                    sum_y += y as u64;
                    count += 1;
                }
            }
        }

        if count == 0 || count < self.min_pixels as u64 {
            log::debug!("no hand ({} skin samples)", count);
            return None;
        }
        let at = Point::new((sum_x / count) as f64, (sum_y / count) as f64);
        log::debug!("hand at ({}, {}) from {} samples", at.x, at.y, count);
        Some(at)
    }
}

/// True if the pixel falls inside the skin region of the CbCr plane.
pub fn is_skin(px: &Rgb<u8>) -> bool {
    let [r, g, b] = px.0;
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let cb = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
    let cr = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
    (CB_RANGE.0..=CB_RANGE.1).contains(&cb) && (CR_RANGE.0..=CR_RANGE.1).contains(&cr)
}

// ════════════════════════════════════════════════════════════════════════════
// Overlay
// ════════════════════════════════════════════════════════════════════════════

/// Paint a crosshair of half-width `r` centered on `at`, clipped to the frame.
pub fn draw_marker(frame: &mut RgbImage, at: Point, r: i64, color: Rgb<u8>) {
    let (w, h) = (frame.width() as i64, frame.height() as i64);
    let (cx, cy) = (at.x.round() as i64, at.y.round() as i64);
    for d in -r..=r {
        for (x, y) in [(cx + d, cy), (cx, cy + d)] {
            if x >= 0 && y >= 0 && x < w && y < h {
                frame.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
