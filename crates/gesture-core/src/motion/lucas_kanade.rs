//! Pyramidal Lucas-Kanade point tracking (forward additive).
//!
//! Each point is tracked coarse to fine. At every level a Gauss-Newton
//! loop solves the 2×2 normal equations over a square window, with
//! gradients taken from the current frame at the warped position.

use reelswipe_common::config::OpticalFlowSettings;

use super::plane::{Plane, Pyramid};

/// Determinant below which the window is considered textureless.
const SINGULAR_DET: f32 = 1e-6;

/// Outcome of tracking one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackStatus {
    Tracked { x: f32, y: f32 },
    /// Singular normal equations at some level.
    Lost,
    /// Converged outside the frame.
    OutOfBounds,
}

impl TrackStatus {
    pub fn position(&self) -> Option<(f32, f32)> {
        match *self {
            Self::Tracked { x, y } => Some((x, y)),
            _ => None,
        }
    }
}

/// Tracker parameters, taken from [`OpticalFlowSettings`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LucasKanade {
    pub window_radius: i32,
    pub max_iterations: u32,
    pub epsilon: f32,
    pub max_level: u32,
}

impl LucasKanade {
    pub fn from_settings(settings: &OpticalFlowSettings) -> Self {
        Self {
            window_radius: settings.window_radius as i32,
            max_iterations: settings.max_iterations,
            epsilon: settings.epsilon,
            max_level: settings.max_level,
        }
    }

    /// Track every `(x, y)` in `points` from `prev` to `curr`.
    pub fn track(&self, prev: &Pyramid, curr: &Pyramid, points: &[(f32, f32)]) -> Vec<TrackStatus> {
        let levels = (self.max_level as usize + 1)
            .min(prev.num_levels())
            .min(curr.num_levels());
        points
            .iter()
            .map(|&(x, y)| self.track_point(prev, curr, x, y, levels))
            .collect()
    }

    fn track_point(&self, prev: &Pyramid, curr: &Pyramid, x: f32, y: f32, levels: usize) -> TrackStatus {
        let mut dx = 0.0f32;
        let mut dy = 0.0f32;

        for level in (0..levels).rev() {
            let scale = 1.0 / (1u32 << level) as f32;
            let Some((ndx, ndy)) = self.refine(
                &prev.levels[level],
                &curr.levels[level],
                x * scale,
                y * scale,
                dx,
                dy,
            ) else {
                return TrackStatus::Lost;
            };
            dx = ndx;
            dy = ndy;
            if level > 0 {
                dx *= 2.0;
                dy *= 2.0;
            }
        }

        let (nx, ny) = (x + dx, y + dy);
        let base = curr.base();
        if nx >= 0.0 && ny >= 0.0 && nx < base.width() as f32 && ny < base.height() as f32 {
            TrackStatus::Tracked { x: nx, y: ny }
        } else {
            TrackStatus::OutOfBounds
        }
    }

    /// Gauss-Newton refinement of `(dx, dy)` at one level. `None` when the
    /// normal equations are singular.
    fn refine(
        &self,
        prev: &Plane,
        curr: &Plane,
        x: f32,
        y: f32,
        mut dx: f32,
        mut dy: f32,
    ) -> Option<(f32, f32)> {
        let r = self.window_radius;
        let eps2 = self.epsilon * self.epsilon;

        for _ in 0..self.max_iterations {
            let (mut h00, mut h01, mut h11) = (0.0f32, 0.0f32, 0.0f32);
            let (mut b0, mut b1) = (0.0f32, 0.0f32);

            for py in -r..=r {
                for px in -r..=r {
                    let (ox, oy) = (px as f32, py as f32);
                    let template = prev.sample(x + ox, y + oy);
                    let (wx, wy) = (x + dx + ox, y + dy + oy);
                    let err = template - curr.sample(wx, wy);

                    let gx = 0.5 * (curr.sample(wx + 1.0, wy) - curr.sample(wx - 1.0, wy));
                    let gy = 0.5 * (curr.sample(wx, wy + 1.0) - curr.sample(wx, wy - 1.0));

                    h00 += gx * gx;
                    h01 += gx * gy;
                    h11 += gy * gy;
                    b0 += gx * err;
                    b1 += gy * err;
                }
            }

            let det = h00 * h11 - h01 * h01;
            if det.abs() < SINGULAR_DET {
                return None;
            }
            let step_x = (h11 * b0 - h01 * b1) / det;
            let step_y = (h00 * b1 - h01 * b0) / det;
            dx += step_x;
            dy += step_y;

            if step_x * step_x + step_y * step_y < eps2 {
                break;
            }
        }

        Some((dx, dy))
    }
}
