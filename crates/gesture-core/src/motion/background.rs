//! Adaptive per-pixel background model.
//!
//! Each pixel keeps an exponential running mean and variance of its
//! grayscale intensity. A pixel is foreground when its squared distance
//! from the mean exceeds `var_threshold` variances. Foreground pixels that
//! are a uniformly darker version of the background are marked as shadow.
//!
//! The learning rate starts at 1 and decays as `1 / frames_seen` until it
//! settles at `1 / history`, so the model locks on quickly and then adapts
//! slowly to lighting drift.

use image::{GrayImage, Luma};
use reelswipe_common::config::ForegroundSettings;

/// Mask value for foreground pixels.
pub const FOREGROUND: u8 = 255;

/// Mask value for shadow pixels.
pub const SHADOW: u8 = 127;

/// Running Gaussian background estimate.
#[derive(Debug, Clone)]
pub struct BackgroundModel {
    width: u32,
    height: u32,
    mean: Vec<f32>,
    var: Vec<f32>,
    frames_seen: u32,
    history: u32,
    var_threshold: f32,
    var_init: f32,
    var_min: f32,
    var_max: f32,
    shadow_ratio: f32,
    warmup_frames: u32,
}

impl BackgroundModel {
    pub fn new(settings: &ForegroundSettings) -> Self {
        Self {
            width: 0,
            height: 0,
            mean: Vec::new(),
            var: Vec::new(),
            frames_seen: 0,
            history: settings.history.max(1),
            var_threshold: settings.var_threshold,
            var_init: settings.var_init.clamp(settings.var_min, settings.var_max),
            var_min: settings.var_min,
            var_max: settings.var_max,
            shadow_ratio: settings.shadow_ratio,
            warmup_frames: settings.warmup_frames,
        }
    }

    /// Dimensions the model was initialised with, if any.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        if self.frames_seen == 0 {
            None
        } else {
            Some((self.width, self.height))
        }
    }

    /// Frames absorbed since the last reset.
    pub fn frames_seen(&self) -> u32 {
        self.frames_seen
    }

    /// Whether the warm-up period has passed.
    pub fn is_stable(&self) -> bool {
        self.frames_seen > self.warmup_frames
    }

    pub fn reset(&mut self) {
        self.width = 0;
        self.height = 0;
        self.mean.clear();
        self.var.clear();
        self.frames_seen = 0;
    }

    /// Classify `gray` against the model, then learn from it.
    ///
    /// Returns a mask with [`FOREGROUND`], [`SHADOW`] or 0 per pixel. A
    /// frame whose size differs from the model's restarts learning.
    pub fn apply(&mut self, gray: &GrayImage) -> GrayImage {
        let (width, height) = gray.dimensions();
        if self.frames_seen == 0 || (width, height) != (self.width, self.height) {
            self.initialise(gray);
            return GrayImage::new(width, height);
        }

        self.frames_seen = self.frames_seen.saturating_add(1);
        let alpha = 1.0 / self.frames_seen.min(self.history) as f32;

        let mut mask = GrayImage::new(width, height);
        for (i, (pixel, out)) in gray.pixels().zip(mask.pixels_mut()).enumerate() {
            let value = f32::from(pixel[0]);
            let mean = self.mean[i];
            let var = self.var[i];
            let diff = value - mean;
            let dist2 = diff * diff;

            if dist2 > self.var_threshold * var {
                *out = Luma([if self.is_shadow(value, mean) {
                    SHADOW
                } else {
                    FOREGROUND
                }]);
            }

            self.mean[i] = mean + alpha * diff;
            self.var[i] = (var + alpha * (dist2 - var)).clamp(self.var_min, self.var_max);
        }

        mask
    }

    fn is_shadow(&self, value: f32, mean: f32) -> bool {
        if self.shadow_ratio <= 0.0 || mean <= 1.0 {
            return false;
        }
        let ratio = value / mean;
        ratio >= self.shadow_ratio && ratio < 1.0
    }

    fn initialise(&mut self, gray: &GrayImage) {
        let (width, height) = gray.dimensions();
        self.width = width;
        self.height = height;
        self.mean = gray.as_raw().iter().map(|&v| f32::from(v)).collect();
        self.var = vec![self.var_init; self.mean.len()];
        self.frames_seen = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ForegroundSettings {
        ForegroundSettings {
            warmup_frames: 3,
            ..Default::default()
        }
    }

    fn flat(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([value]))
    }

    #[test]
    fn static_scene_has_no_foreground() {
        let mut model = BackgroundModel::new(&settings());
        for _ in 0..10 {
            let mask = model.apply(&flat(16, 16, 80));
            assert!(mask.pixels().all(|p| p[0] == 0));
        }
        assert!(model.is_stable());
    }

    #[test]
    fn bright_object_is_foreground() {
        let mut model = BackgroundModel::new(&settings());
        for _ in 0..10 {
            model.apply(&flat(16, 16, 40));
        }
        let mut frame = flat(16, 16, 40);
        frame.put_pixel(5, 5, Luma([220]));
        let mask = model.apply(&frame);
        assert_eq!(mask.get_pixel(5, 5)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn darker_copy_of_background_is_shadow() {
        let mut model = BackgroundModel::new(&settings());
        for _ in 0..10 {
            model.apply(&flat(16, 16, 200));
        }
        let mut frame = flat(16, 16, 200);
        frame.put_pixel(3, 3, Luma([140])); // 70% of background
        frame.put_pixel(4, 4, Luma([20])); // far too dark for a shadow
        let mask = model.apply(&frame);
        assert_eq!(mask.get_pixel(3, 3)[0], SHADOW);
        assert_eq!(mask.get_pixel(4, 4)[0], FOREGROUND);
    }

    #[test]
    fn warmup_gates_stability() {
        let mut model = BackgroundModel::new(&settings());
        model.apply(&flat(8, 8, 10));
        assert!(!model.is_stable());
        for _ in 0..3 {
            model.apply(&flat(8, 8, 10));
        }
        assert!(model.is_stable());
    }

    #[test]
    fn size_change_restarts_learning() {
        let mut model = BackgroundModel::new(&settings());
        for _ in 0..5 {
            model.apply(&flat(8, 8, 10));
        }
        let mask = model.apply(&flat(12, 6, 250));
        assert_eq!(mask.dimensions(), (12, 6));
        assert_eq!(model.frames_seen(), 1);
        assert_eq!(model.dimensions(), Some((12, 6)));
    }

    #[test]
    fn reset_forgets_everything() {
        let mut model = BackgroundModel::new(&settings());
        model.apply(&flat(8, 8, 10));
        model.reset();
        assert_eq!(model.dimensions(), None);
        assert!(!model.is_stable());
    }
}
