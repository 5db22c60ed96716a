//! Single-channel `f32` image plane and image pyramid for optical flow.

use image::GrayImage;

/// Row-major `f32` intensity plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    pub fn from_gray(gray: &GrayImage) -> Self {
        Self {
            width: gray.width() as usize,
            height: gray.height() as usize,
            data: gray.as_raw().iter().map(|&v| f32::from(v)).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Bilinear sample; coordinates outside the plane clamp to the border.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        if self.width == 0 || self.height == 0 {
            return 0.0;
        }
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let top = self.get(x0, y0) * (1.0 - fx) + self.get(x1, y0) * fx;
        let bottom = self.get(x0, y1) * (1.0 - fx) + self.get(x1, y1) * fx;
        top * (1.0 - fy) + bottom * fy
    }

    /// Half-resolution plane by 2×2 box averaging. Odd trailing rows and
    /// columns are dropped.
    pub fn downsample(&self) -> Self {
        let width = self.width / 2;
        let height = self.height / 2;
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let (sx, sy) = (x * 2, y * 2);
                let sum = self.get(sx, sy)
                    + self.get(sx + 1, sy)
                    + self.get(sx, sy + 1)
                    + self.get(sx + 1, sy + 1);
                data.push(sum * 0.25);
            }
        }
        Self {
            width,
            height,
            data,
        }
    }
}

/// Coarse-to-fine stack of planes. Level 0 is full resolution.
#[derive(Debug, Clone)]
pub struct Pyramid {
    pub levels: Vec<Plane>,
}

impl Pyramid {
    /// Build up to `max_level` halvings above the base. Stops early once a
    /// level would be smaller than `min_side` pixels.
    pub fn build(base: Plane, max_level: u32, min_side: usize) -> Self {
        let mut levels = vec![base];
        for _ in 0..max_level {
            let Some(last) = levels.last() else { break };
            if last.width() / 2 < min_side || last.height() / 2 < min_side {
                break;
            }
            let next = last.downsample();
            levels.push(next);
        }
        Self { levels }
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn base(&self) -> &Plane {
        &self.levels[0]
    }
}
