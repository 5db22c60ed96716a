//! Background subtraction + contour centroid backend.
//!
//! # Pipeline
//!
//! 1. Grayscale and Gaussian blur.
//! 2. Foreground mask from the adaptive [`BackgroundModel`].
//! 3. Shadow pixels dropped from the mask.
//! 4. Morphological close (fill gaps) then open (remove speckle).
//! 5. Outer contours; keep those with hand-sized area.
//! 6. Centroid `(M10 / M00, M01 / M00)` of the largest survivor,
//!    normalized by the frame size.

use image::{GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use reelswipe_common::config::ForegroundSettings;
use reelswipe_common::error::{ReelswipeError, ReelswipeResult};

use super::background::{BackgroundModel, FOREGROUND};
use super::geometry::PolygonMoments;
use super::{check_frame, ExtractorKind, MotionExtractor, MotionSample};

/// Tracks the largest hand-sized moving blob.
#[derive(Debug, Clone)]
pub struct ForegroundCentroidExtractor {
    settings: ForegroundSettings,
    model: BackgroundModel,
}

impl ForegroundCentroidExtractor {
    pub fn new(settings: ForegroundSettings) -> ReelswipeResult<Self> {
        settings.validate()?;
        let model = BackgroundModel::new(&settings);
        Ok(Self { settings, model })
    }

    pub fn settings(&self) -> &ForegroundSettings {
        &self.settings
    }

    /// Whether the background model has finished warming up.
    pub fn is_stable(&self) -> bool {
        self.model.is_stable()
    }

    /// Run steps 1-4 and return the cleaned binary mask.
    ///
    /// Always feeds the background model, even during warm-up.
    pub fn foreground_mask(&mut self, frame: &RgbImage) -> GrayImage {
        let gray = image::imageops::grayscale(frame);
        let blurred = imageproc::filter::gaussian_blur_f32(&gray, self.settings.blur_sigma);

        let mut mask = self.model.apply(&blurred);
        for pixel in mask.pixels_mut() {
            if pixel[0] != FOREGROUND {
                pixel[0] = 0;
            }
        }

        if self.settings.morph_radius == 0 {
            return mask;
        }
        let closed = imageproc::morphology::close(&mask, Norm::LInf, self.settings.morph_radius);
        imageproc::morphology::open(&closed, Norm::LInf, self.settings.morph_radius)
    }

    /// Area and moments of the largest outer contour within the area bounds,
    /// plus the summed area of all outer contours.
    fn largest_blob(&self, mask: &GrayImage) -> (Option<PolygonMoments>, f64) {
        let mut total_area = 0.0;
        let mut best: Option<PolygonMoments> = None;

        for contour in find_contours::<u32>(mask) {
            if contour.border_type != BorderType::Outer || contour.parent.is_some() {
                continue;
            }
            let moments = PolygonMoments::of_contour(&contour.points);
            let area = moments.area();
            total_area += area;

            if area < self.settings.min_contour_area || area > self.settings.max_contour_area {
                continue;
            }
            if best.map_or(true, |b| area > b.area()) {
                best = Some(moments);
            }
        }

        (best, total_area)
    }
}

impl MotionExtractor for ForegroundCentroidExtractor {
    fn extract(&mut self, frame: &RgbImage) -> ReelswipeResult<Option<MotionSample>> {
        check_frame(frame)?;

        let (width, height) = frame.dimensions();
        let resized = self
            .model
            .dimensions()
            .is_some_and(|dims| dims != (width, height));

        let mask = self.foreground_mask(frame);
        if resized {
            return Err(ReelswipeError::frame(format!(
                "frame size changed to {width}x{height}; background model restarted"
            )));
        }
        if !self.model.is_stable() {
            return Ok(None);
        }

        let (best, total_area) = self.largest_blob(&mask);
        let Some(moments) = best else {
            return Ok(None);
        };
        let (cx, cy) = moments
            .centroid()
            .ok_or_else(|| ReelswipeError::frame("degenerate contour moments"))?;

        let confidence = if total_area > 0.0 {
            moments.area() / total_area
        } else {
            0.0
        };

        Ok(Some(MotionSample::new(
            cx / f64::from(width),
            cy / f64::from(height),
            confidence,
        )))
    }

    fn reset(&mut self) {
        self.model.reset();
    }

    fn kind(&self) -> ExtractorKind {
        ExtractorKind::ForegroundCentroid
    }
}
