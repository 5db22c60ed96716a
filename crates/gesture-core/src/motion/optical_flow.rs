//! Sparse optical flow backend.
//!
//! Corners are detected on the previous frame and tracked into the current
//! one. The mean displacement of the surviving tracks, normalized by the
//! frame size, is integrated into a running position that starts at the
//! frame centre. The classifier then sees a smooth trajectory even though
//! no single object is segmented.
//!
//! The position returns to the centre after every confirmed swipe and
//! whenever it would leave the frame, so sustained motion in one direction
//! keeps producing displacement.

use image::{GrayImage, RgbImage};
use reelswipe_common::config::OpticalFlowSettings;
use reelswipe_common::error::{ReelswipeError, ReelswipeResult};

use super::corners::good_features_to_track;
use super::lucas_kanade::LucasKanade;
use super::plane::{Plane, Pyramid};
use super::{check_frame, ExtractorKind, MotionExtractor, MotionSample};

/// Pyramid levels stop once a side would drop below this.
const MIN_PYRAMID_SIDE: usize = 16;

const START: (f64, f64) = (0.5, 0.5);

struct PreviousFrame {
    gray: GrayImage,
    pyramid: Pyramid,
}

/// Integrates mean Lucas-Kanade flow into a normalized position.
pub struct OpticalFlowExtractor {
    settings: OpticalFlowSettings,
    tracker: LucasKanade,
    previous: Option<PreviousFrame>,
    position: (f64, f64),
}

impl OpticalFlowExtractor {
    pub fn new(settings: OpticalFlowSettings) -> ReelswipeResult<Self> {
        settings.validate()?;
        Ok(Self {
            tracker: LucasKanade::from_settings(&settings),
            settings,
            previous: None,
            position: START,
        })
    }

    pub fn settings(&self) -> &OpticalFlowSettings {
        &self.settings
    }

    /// Current integrated position.
    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    fn remember(&mut self, gray: GrayImage) {
        let pyramid = Pyramid::build(
            Plane::from_gray(&gray),
            self.settings.max_level,
            MIN_PYRAMID_SIDE,
        );
        self.previous = Some(PreviousFrame { gray, pyramid });
    }

    /// Mean displacement in pixels and the tracked fraction, or `None` when
    /// too few corners survive.
    fn mean_flow(&self, previous: &PreviousFrame, current: &Pyramid) -> Option<(f64, f64, f64)> {
        let corners = good_features_to_track(&previous.gray, &self.settings);
        if corners.len() < self.settings.min_tracked {
            tracing::trace!(corners = corners.len(), "Too few corners to track");
            return None;
        }

        let points: Vec<(f32, f32)> = corners.iter().map(|c| (c.x, c.y)).collect();
        let statuses = self.tracker.track(&previous.pyramid, current, &points);

        let (mut sum_x, mut sum_y, mut tracked) = (0.0f64, 0.0f64, 0usize);
        for (&(x0, y0), status) in points.iter().zip(&statuses) {
            if let Some((x1, y1)) = status.position() {
                sum_x += f64::from(x1 - x0);
                sum_y += f64::from(y1 - y0);
                tracked += 1;
            }
        }
        if tracked < self.settings.min_tracked {
            tracing::trace!(tracked, detected = points.len(), "Too few tracks survived");
            return None;
        }

        let n = tracked as f64;
        Some((sum_x / n, sum_y / n, n / points.len() as f64))
    }
}

impl MotionExtractor for OpticalFlowExtractor {
    fn extract(&mut self, frame: &RgbImage) -> ReelswipeResult<Option<MotionSample>> {
        check_frame(frame)?;
        let gray = image::imageops::grayscale(frame);

        let Some(previous) = self.previous.take() else {
            self.remember(gray);
            return Ok(None);
        };

        if previous.gray.dimensions() != gray.dimensions() {
            let (width, height) = gray.dimensions();
            self.position = START;
            self.remember(gray);
            return Err(ReelswipeError::frame(format!(
                "frame size changed to {width}x{height}; flow restarted"
            )));
        }

        let current = Pyramid::build(
            Plane::from_gray(&gray),
            self.settings.max_level,
            MIN_PYRAMID_SIDE,
        );
        let flow = self.mean_flow(&previous, &current);
        self.previous = Some(PreviousFrame {
            gray,
            pyramid: current,
        });

        let Some((dx, dy, confidence)) = flow else {
            return Ok(None);
        };

        let (width, height) = frame.dimensions();
        let next = (
            self.position.0 + dx / f64::from(width),
            self.position.1 + dy / f64::from(height),
        );
        let inside = |v: f64| (0.0..=1.0).contains(&v);
        if !(inside(next.0) && inside(next.1)) {
            tracing::trace!(x = next.0, y = next.1, "Flow position left the frame; recentring");
            self.position = START;
            return Ok(Some(
                MotionSample::new(START.0, START.1, confidence).after_rebase(),
            ));
        }

        self.position = next;
        Ok(Some(MotionSample::new(next.0, next.1, confidence)))
    }

    fn reset(&mut self) {
        self.previous = None;
        self.position = START;
    }

    fn rebase(&mut self) {
        self.position = START;
    }

    fn kind(&self) -> ExtractorKind {
        ExtractorKind::OpticalFlow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const SIZE: u32 = 96;

    /// Textured scene of Gaussian blobs, shifted by `offset` pixels.
    fn scene(offset: (f32, f32)) -> RgbImage {
        let centers = [
            (18.0, 20.0),
            (46.0, 16.0),
            (74.0, 22.0),
            (24.0, 48.0),
            (52.0, 44.0),
            (78.0, 52.0),
            (16.0, 76.0),
            (44.0, 74.0),
            (70.0, 80.0),
        ];
        RgbImage::from_fn(SIZE, SIZE, |x, y| {
            let mut v = 20.0f32;
            for (cx, cy) in centers {
                let dx = x as f32 - (cx + offset.0);
                let dy = y as f32 - (cy + offset.1);
                v += 200.0 * (-(dx * dx + dy * dy) / 18.0).exp();
            }
            let v = v.min(255.0) as u8;
            Rgb([v, v, v])
        })
    }

    fn extractor() -> OpticalFlowExtractor {
        OpticalFlowExtractor::new(OpticalFlowSettings::default()).unwrap()
    }

    #[test]
    fn first_frame_only_primes() {
        let mut flow = extractor();
        assert_eq!(flow.extract(&scene((0.0, 0.0))).unwrap(), None);
        assert_eq!(flow.position(), START);
    }

    #[test]
    fn downward_shift_moves_position_down() {
        let mut flow = extractor();
        flow.extract(&scene((0.0, 0.0))).unwrap();
        let sample = flow
            .extract(&scene((0.0, 3.0)))
            .unwrap()
            .expect("textured scene should track");

        let expected = 0.5 + 3.0 / f64::from(SIZE);
        assert!((sample.y - expected).abs() < 0.01, "y = {}", sample.y);
        assert!((sample.x - 0.5).abs() < 0.01, "x = {}", sample.x);
        assert!(sample.confidence > 0.5);
    }

    #[test]
    fn uniform_frames_yield_nothing() {
        let mut flow = extractor();
        let flat = RgbImage::from_pixel(SIZE, SIZE, Rgb([100, 100, 100]));
        assert_eq!(flow.extract(&flat).unwrap(), None);
        assert_eq!(flow.extract(&flat).unwrap(), None);
    }

    #[test]
    fn size_change_is_transient_and_restarts() {
        let mut flow = extractor();
        flow.extract(&scene((0.0, 0.0))).unwrap();
        let err = flow
            .extract(&RgbImage::from_pixel(48, 48, Rgb([0, 0, 0])))
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(flow.position(), START);
    }

    #[test]
    fn reset_recentres() {
        let mut flow = extractor();
        flow.extract(&scene((0.0, 0.0))).unwrap();
        flow.extract(&scene((0.0, 3.0))).unwrap();
        flow.reset();
        assert_eq!(flow.position(), START);
        assert_eq!(flow.extract(&scene((0.0, 6.0))).unwrap(), None);
    }

    #[test]
    fn rebase_recentres_but_keeps_tracking() {
        let mut flow = extractor();
        flow.extract(&scene((0.0, 0.0))).unwrap();
        flow.extract(&scene((0.0, 3.0))).unwrap();
        flow.rebase();
        assert_eq!(flow.position(), START);

        let sample = flow
            .extract(&scene((0.0, 6.0)))
            .unwrap()
            .expect("previous frame survives a rebase");
        let expected = 0.5 + 3.0 / f64::from(SIZE);
        assert!((sample.y - expected).abs() < 0.01, "y = {}", sample.y);
        assert!(!sample.rebased);
    }

    #[test]
    fn leaving_the_frame_recentres_and_flags_the_sample() {
        let mut flow = extractor();
        flow.extract(&scene((0.0, 0.0))).unwrap();
        flow.position = (0.5, 0.99);

        let sample = flow
            .extract(&scene((0.0, 3.0)))
            .unwrap()
            .expect("textured scene should track");
        assert!(sample.rebased);
        assert_eq!((sample.x, sample.y), START);
        assert_eq!(flow.position(), START);

        let sample = flow.extract(&scene((0.0, 6.0))).unwrap().unwrap();
        assert!(!sample.rebased);
        assert!(sample.y > 0.5);
    }

    #[test]
    fn rejects_invalid_settings() {
        let bad = OpticalFlowSettings {
            epsilon: 0.0,
            ..Default::default()
        };
        assert!(OpticalFlowExtractor::new(bad).is_err());
    }
}
