//! Polygon moments for contour centroids.
//!
//! Contours come back as ordered boundary pixels. Area and centroid are
//! computed from the closed polygon through those points (Green's
//! theorem), matching how contour moments are usually defined.

use imageproc::point::Point;

/// Zeroth and first-order moments of a closed polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonMoments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl PolygonMoments {
    /// Moments of the polygon through `points`, oriented so `m00 >= 0`.
    pub fn of_contour(points: &[Point<u32>]) -> Self {
        let n = points.len();
        if n < 3 {
            return Self {
                m00: 0.0,
                m10: 0.0,
                m01: 0.0,
            };
        }

        let mut a2 = 0.0;
        let mut cx6 = 0.0;
        let mut cy6 = 0.0;
        for i in 0..n {
            let p = points[i];
            let q = points[(i + 1) % n];
            let (x0, y0) = (f64::from(p.x), f64::from(p.y));
            let (x1, y1) = (f64::from(q.x), f64::from(q.y));
            let cross = x0 * y1 - x1 * y0;
            a2 += cross;
            cx6 += (x0 + x1) * cross;
            cy6 += (y0 + y1) * cross;
        }

        let sign = if a2 < 0.0 { -1.0 } else { 1.0 };
        Self {
            m00: sign * a2 / 2.0,
            m10: sign * cx6 / 6.0,
            m01: sign * cy6 / 6.0,
        }
    }

    /// Enclosed area (px²).
    pub fn area(&self) -> f64 {
        self.m00
    }

    /// `(M10 / M00, M01 / M00)`, or `None` for a degenerate polygon.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00.abs() <= f64::EPSILON {
            return None;
        }
        Some((self.m10 / self.m00, self.m01 / self.m00))
    }
}
