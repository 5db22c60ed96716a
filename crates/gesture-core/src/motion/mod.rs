//! Per-frame motion extraction.
//!
//! # Strategy pattern
//!
//! Every backend reduces a color frame to at most one normalized position.
//! The classifier and controller are written once against
//! [`MotionExtractor`]; the backend is picked by [`ExtractorKind`] at
//! construction. Backends are Cargo features, so a build without one
//! reports it as unavailable instead of failing mid-session.

use std::str::FromStr;

use image::RgbImage;
use reelswipe_common::config::DetectorSettings;
use reelswipe_common::error::{ReelswipeError, ReelswipeResult};

use crate::config::ClassifierPolicy;

#[cfg(feature = "foreground")]
pub mod background;
#[cfg(feature = "optical-flow")]
pub mod corners;
#[cfg(feature = "foreground")]
pub mod foreground;
#[cfg(feature = "foreground")]
pub mod geometry;
#[cfg(feature = "optical-flow")]
pub mod lucas_kanade;
#[cfg(feature = "optical-flow")]
pub mod optical_flow;
#[cfg(feature = "optical-flow")]
pub mod plane;

#[cfg(feature = "foreground")]
pub use foreground::ForegroundCentroidExtractor;
#[cfg(feature = "optical-flow")]
pub use optical_flow::OpticalFlowExtractor;

/// One frame's motion reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    /// Normalized column, `[0, 1]`.
    pub x: f64,
    /// Normalized row, `[0, 1]`.
    pub y: f64,
    /// Backend-specific confidence in `[0, 1]`.
    pub confidence: f64,
    /// The backend moved its coordinate origin with this sample. Earlier
    /// positions cannot be compared against it.
    pub rebased: bool,
}

impl MotionSample {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            rebased: false,
        }
    }

    /// Mark this sample as the first one after an origin change.
    pub fn after_rebase(self) -> Self {
        Self {
            rebased: true,
            ..self
        }
    }
}

/// Reduces a frame to a representative position.
///
/// `Ok(None)` means nothing usable moved this frame. `Err` carries a
/// transient frame problem (empty frame, size change, degenerate
/// geometry); callers drop the frame and continue.
pub trait MotionExtractor: Send {
    fn extract(&mut self, frame: &RgbImage) -> ReelswipeResult<Option<MotionSample>>;

    /// Discard learned state (background model, previous frame, ...).
    fn reset(&mut self);

    /// The caller dropped its position history. Backends that report a
    /// relative position move it back to their origin; absolute ones ignore this.
    fn rebase(&mut self) {}

    fn kind(&self) -> ExtractorKind;
}

/// Available motion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExtractorKind {
    /// Adaptive background subtraction; centroid of the largest
    /// hand-sized foreground contour.
    #[default]
    ForegroundCentroid,
    /// Mean sparse Lucas-Kanade displacement, integrated into a position.
    OpticalFlow,
}

impl ExtractorKind {
    pub const ALL: [ExtractorKind; 2] = [Self::ForegroundCentroid, Self::OpticalFlow];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForegroundCentroid => "foreground",
            Self::OpticalFlow => "optical-flow",
        }
    }

    /// Whether this backend was compiled in.
    pub fn is_available(&self) -> bool {
        match self {
            Self::ForegroundCentroid => cfg!(feature = "foreground"),
            Self::OpticalFlow => cfg!(feature = "optical-flow"),
        }
    }

    /// Compiled-in backends, in preference order.
    pub fn available() -> Vec<ExtractorKind> {
        Self::ALL.into_iter().filter(|k| k.is_available()).collect()
    }

    /// Classifier policy paired with this backend.
    ///
    /// Contour centroids jitter, so the foreground backend gets the
    /// consistency gate and vote confirmation. Flow positions are already
    /// integrated and smooth.
    pub fn default_policy(&self) -> ClassifierPolicy {
        match self {
            Self::ForegroundCentroid => ClassifierPolicy::hardened(),
            Self::OpticalFlow => ClassifierPolicy::immediate(),
        }
    }
}

impl FromStr for ExtractorKind {
    type Err = ReelswipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "foreground" | "contour" | "background" => Ok(Self::ForegroundCentroid),
            "optical-flow" | "flow" | "lk" => Ok(Self::OpticalFlow),
            other => Err(ReelswipeError::config(format!(
                "unknown motion strategy '{other}' (expected 'foreground' or 'optical-flow')"
            ))),
        }
    }
}

impl std::fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the requested backend with its tuning from `settings`.
pub fn build_extractor(
    kind: ExtractorKind,
    settings: &DetectorSettings,
) -> ReelswipeResult<Box<dyn MotionExtractor>> {
    if !kind.is_available() {
        return Err(ReelswipeError::unsupported(format!(
            "motion backend '{kind}' is not compiled in (available: {})",
            describe(&ExtractorKind::available())
        )));
    }

    tracing::debug!(backend = %kind, "Building motion extractor");

    match kind {
        #[cfg(feature = "foreground")]
        ExtractorKind::ForegroundCentroid => Ok(Box::new(ForegroundCentroidExtractor::new(
            settings.foreground.clone(),
        )?)),
        #[cfg(feature = "optical-flow")]
        ExtractorKind::OpticalFlow => Ok(Box::new(OpticalFlowExtractor::new(
            settings.optical_flow.clone(),
        )?)),
        #[allow(unreachable_patterns)]
        other => Err(ReelswipeError::unsupported(format!(
            "motion backend '{other}' is not compiled in"
        ))),
    }
}

fn describe(kinds: &[ExtractorKind]) -> String {
    if kinds.is_empty() {
        return "none".to_string();
    }
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reject frames no backend can work with.
pub(crate) fn check_frame(frame: &RgbImage) -> ReelswipeResult<()> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(ReelswipeError::frame("empty frame"));
    }
    Ok(())
}
