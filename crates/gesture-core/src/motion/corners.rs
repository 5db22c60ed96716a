//! Minimum-eigenvalue ("good features to track") corner detection.
//!
//! Each pixel is scored by the smaller eigenvalue of its structure tensor,
//! summed over a square block of Sobel gradients. Corners must be local
//! maxima, reach `quality_level` of the strongest score, and keep
//! `min_distance` from every stronger accepted corner.

use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use reelswipe_common::config::OpticalFlowSettings;

/// A detected corner in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub x: f32,
    pub y: f32,
    /// Minimum eigenvalue of the structure tensor.
    pub score: f32,
}

/// Scores below this are treated as flat image regardless of quality level.
const MIN_ABSOLUTE_SCORE: f64 = 1e-3;

/// Summed-area table for O(1) block sums.
struct Integral {
    stride: usize,
    sums: Vec<f64>,
}

impl Integral {
    fn new(values: &[f64], width: usize, height: usize) -> Self {
        let stride = width + 1;
        let mut sums = vec![0.0; stride * (height + 1)];
        for y in 0..height {
            let mut row = 0.0;
            for x in 0..width {
                row += values[y * width + x];
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row;
            }
        }
        Self { stride, sums }
    }

    /// Sum over the inclusive rectangle `[x0, x1] × [y0, y1]`.
    fn block(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
        let s = self.stride;
        self.sums[(y1 + 1) * s + x1 + 1] - self.sums[y0 * s + x1 + 1] - self.sums[(y1 + 1) * s + x0]
            + self.sums[y0 * s + x0]
    }
}

/// Per-pixel minimum-eigenvalue response. Pixels closer than
/// `block_radius + 1` to the border score 0.
pub fn min_eigen_response(gray: &GrayImage, block_radius: u32) -> Vec<f64> {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let r = block_radius as usize;
    let mut response = vec![0.0; w * h];
    if w <= 2 * (r + 1) || h <= 2 * (r + 1) {
        return response;
    }

    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);
    let mut xx = Vec::with_capacity(w * h);
    let mut xy = Vec::with_capacity(w * h);
    let mut yy = Vec::with_capacity(w * h);
    for (dx, dy) in gx.as_raw().iter().zip(gy.as_raw().iter()) {
        // Sobel kernels carry a gain of 8.
        let dx = f64::from(*dx) / 8.0;
        let dy = f64::from(*dy) / 8.0;
        xx.push(dx * dx);
        xy.push(dx * dy);
        yy.push(dy * dy);
    }
    let (ixx, ixy, iyy) = (
        Integral::new(&xx, w, h),
        Integral::new(&xy, w, h),
        Integral::new(&yy, w, h),
    );

    let margin = r + 1;
    for y in margin..h - margin {
        for x in margin..w - margin {
            let (x0, y0, x1, y1) = (x - r, y - r, x + r, y + r);
            let a = ixx.block(x0, y0, x1, y1);
            let b = ixy.block(x0, y0, x1, y1);
            let c = iyy.block(x0, y0, x1, y1);
            let half_trace = (a + c) * 0.5;
            let root = (((a - c) * 0.5).powi(2) + b * b).sqrt();
            response[y * w + x] = (half_trace - root).max(0.0);
        }
    }
    response
}

/// Detect up to `settings.max_corners` well-separated corners, strongest first.
pub fn good_features_to_track(gray: &GrayImage, settings: &OpticalFlowSettings) -> Vec<Corner> {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let response = min_eigen_response(gray, settings.block_radius);

    let strongest = response.iter().copied().fold(0.0f64, f64::max);
    if strongest <= MIN_ABSOLUTE_SCORE {
        return Vec::new();
    }
    let threshold = strongest * f64::from(settings.quality_level);

    let mut candidates = Vec::new();
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let score = response[y * w + x];
            if score < threshold {
                continue;
            }
            let is_peak = (y - 1..=y + 1)
                .flat_map(|ny| (x - 1..=x + 1).map(move |nx| (nx, ny)))
                .all(|(nx, ny)| response[ny * w + nx] <= score);
            if is_peak {
                candidates.push(Corner {
                    x: x as f32,
                    y: y as f32,
                    score: score as f32,
                });
            }
        }
    }
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let min_dist2 = settings.min_distance * settings.min_distance;
    let mut accepted: Vec<Corner> = Vec::with_capacity(settings.max_corners);
    for candidate in candidates {
        if accepted.len() >= settings.max_corners {
            break;
        }
        let crowded = accepted.iter().any(|c| {
            let (dx, dy) = (c.x - candidate.x, c.y - candidate.y);
            dx * dx + dy * dy < min_dist2
        });
        if !crowded {
            accepted.push(candidate);
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn square_on_black(size: u32, x0: u32, y0: u32, side: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            let inside = x >= x0 && x < x0 + side && y >= y0 && y < y0 + side;
            Luma([if inside { 200 } else { 20 }])
        })
    }

    #[test]
    fn flat_image_has_no_corners() {
        let flat = GrayImage::from_pixel(40, 40, Luma([128]));
        assert!(good_features_to_track(&flat, &OpticalFlowSettings::default()).is_empty());
    }

    #[test]
    fn straight_edge_scores_lower_than_corner() {
        let img = square_on_black(48, 12, 12, 24);
        let response = min_eigen_response(&img, 3);
        let corner = response[12 * 48 + 12];
        let edge_mid = response[24 * 48 + 12];
        assert!(corner > edge_mid * 4.0, "corner={corner} edge={edge_mid}");
    }

    #[test]
    fn finds_the_four_corners_of_a_square() {
        let img = square_on_black(48, 12, 12, 24);
        let corners = good_features_to_track(&img, &OpticalFlowSettings::default());
        assert_eq!(corners.len(), 4, "corners: {corners:?}");
        for (cx, cy) in [(12.0, 12.0), (35.0, 12.0), (12.0, 35.0), (35.0, 35.0)] {
            assert!(
                corners
                    .iter()
                    .any(|c| (c.x - cx).abs() <= 3.0 && (c.y - cy).abs() <= 3.0),
                "missing corner near ({cx}, {cy}): {corners:?}"
            );
        }
    }

    #[test]
    fn respects_max_corners_and_spacing() {
        let img = GrayImage::from_fn(64, 64, |x, y| {
            Luma([if (x / 8 + y / 8) % 2 == 0 { 220 } else { 30 }])
        });
        let settings = OpticalFlowSettings {
            max_corners: 6,
            ..Default::default()
        };
        let corners = good_features_to_track(&img, &settings);
        assert_eq!(corners.len(), 6);
        for (i, a) in corners.iter().enumerate() {
            for b in &corners[i + 1..] {
                let d2 = (a.x - b.x).powi(2) + (a.y - b.y).powi(2);
                assert!(d2 >= settings.min_distance.powi(2));
            }
        }
    }
}
