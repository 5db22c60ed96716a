//! Application configuration.
//!
//! Raw, serializable settings. Domain crates turn these into validated
//! types (`SwipeConfig`, `ExtractorKind`, ...) and reject bad values there.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReelswipeError, ReelswipeResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Swipe detection thresholds.
    pub swipe: SwipeDefaults,

    /// Motion extraction backend and its tuning.
    pub detector: DetectorSettings,

    /// Key scheme used when reporting actions ("arrows", "wasd", "jk", "space").
    pub keys: String,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Swipe thresholds as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeDefaults {
    /// Minimum primary-axis displacement, as a fraction of the frame.
    pub min_displacement: f64,

    /// Seconds within which the movement must complete.
    pub max_duration: f64,

    /// "vertical" or "horizontal".
    pub axis: String,

    /// Number of samples kept for swipe analysis.
    pub history: usize,

    /// Seconds between accepted swipes.
    pub cooldown: f64,
}

/// Motion extraction settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// "foreground" or "optical-flow".
    pub strategy: String,

    pub foreground: ForegroundSettings,

    pub optical_flow: OpticalFlowSettings,
}

/// Tuning for the background-subtraction + contour backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForegroundSettings {
    /// Gaussian pre-blur sigma (pixels).
    pub blur_sigma: f32,

    /// Frames over which the background model averages.
    pub history: u32,

    /// Squared Mahalanobis distance above which a pixel is foreground.
    pub var_threshold: f32,

    /// Variance assigned to a freshly initialised pixel.
    pub var_init: f32,

    /// Lower bound on per-pixel variance.
    pub var_min: f32,

    /// Upper bound on per-pixel variance.
    pub var_max: f32,

    /// Foreground pixels darker than the background by a ratio in
    /// `[shadow_ratio, 1)` are treated as shadow. `0` disables.
    pub shadow_ratio: f32,

    /// Frames to learn before any detection is reported.
    pub warmup_frames: u32,

    /// Radius of the square structuring element for close/open.
    pub morph_radius: u8,

    /// Smallest accepted contour area (px²).
    pub min_contour_area: f64,

    /// Largest accepted contour area (px²).
    pub max_contour_area: f64,
}

/// Tuning for the sparse optical-flow backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpticalFlowSettings {
    /// Maximum corners detected per frame.
    pub max_corners: usize,

    /// Corners weaker than `quality_level * strongest` are discarded.
    pub quality_level: f32,

    /// Minimum separation between accepted corners (px).
    pub min_distance: f32,

    /// Half-size of the structure-tensor block used to score corners.
    pub block_radius: u32,

    /// Half-size of the Lucas-Kanade window (7 gives 15×15).
    pub window_radius: u32,

    /// Highest pyramid level above the base image.
    pub max_level: u32,

    /// Iteration cap per pyramid level.
    pub max_iterations: u32,

    /// Convergence threshold on the per-iteration update (px).
    pub epsilon: f32,

    /// Fewer surviving tracks than this yields no detection.
    pub min_tracked: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelswipe_gesture=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            swipe: SwipeDefaults::default(),
            detector: DetectorSettings::default(),
            keys: "arrows".to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SwipeDefaults {
    fn default() -> Self {
        Self {
            min_displacement: 0.15,
            max_duration: 0.6,
            axis: "vertical".to_string(),
            history: 5,
            cooldown: 0.8,
        }
    }
}

impl Default for ForegroundSettings {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            history: 500,
            var_threshold: 50.0,
            var_init: 15.0,
            var_min: 4.0,
            var_max: 75.0,
            shadow_ratio: 0.5,
            warmup_frames: 30,
            morph_radius: 2,
            min_contour_area: 2000.0,
            max_contour_area: 50000.0,
        }
    }
}

impl Default for OpticalFlowSettings {
    fn default() -> Self {
        Self {
            max_corners: 100,
            quality_level: 0.3,
            min_distance: 7.0,
            block_radius: 3,
            window_radius: 7,
            max_level: 2,
            max_iterations: 10,
            epsilon: 0.03,
            min_tracked: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ForegroundSettings {
    /// Reject values that would make the backend misbehave.
    pub fn validate(&self) -> ReelswipeResult<()> {
        if !(self.blur_sigma > 0.0 && self.blur_sigma.is_finite()) {
            return Err(ReelswipeError::config("foreground.blur_sigma must be > 0"));
        }
        if self.history == 0 {
            return Err(ReelswipeError::config("foreground.history must be >= 1"));
        }
        if !(self.var_threshold > 0.0) {
            return Err(ReelswipeError::config(
                "foreground.var_threshold must be > 0",
            ));
        }
        if !(self.var_min > 0.0 && self.var_min <= self.var_max) {
            return Err(ReelswipeError::config(
                "foreground variance bounds must satisfy 0 < var_min <= var_max",
            ));
        }
        if !(0.0..1.0).contains(&self.shadow_ratio) {
            return Err(ReelswipeError::config(
                "foreground.shadow_ratio must be in [0, 1)",
            ));
        }
        if !(self.min_contour_area > 0.0 && self.min_contour_area <= self.max_contour_area) {
            return Err(ReelswipeError::config(format!(
                "contour area range [{}, {}] is empty",
                self.min_contour_area, self.max_contour_area
            )));
        }
        Ok(())
    }
}

impl OpticalFlowSettings {
    /// Reject values that would make the backend misbehave.
    pub fn validate(&self) -> ReelswipeResult<()> {
        if self.max_corners == 0 {
            return Err(ReelswipeError::config(
                "optical_flow.max_corners must be >= 1",
            ));
        }
        if !(self.quality_level > 0.0 && self.quality_level <= 1.0) {
            return Err(ReelswipeError::config(
                "optical_flow.quality_level must be in (0, 1]",
            ));
        }
        if self.min_distance < 0.0 {
            return Err(ReelswipeError::config(
                "optical_flow.min_distance must be >= 0",
            ));
        }
        if self.window_radius == 0 || self.block_radius == 0 {
            return Err(ReelswipeError::config(
                "optical_flow window and block radii must be >= 1",
            ));
        }
        if self.max_iterations == 0 {
            return Err(ReelswipeError::config(
                "optical_flow.max_iterations must be >= 1",
            ));
        }
        if !(self.epsilon > 0.0) {
            return Err(ReelswipeError::config("optical_flow.epsilon must be > 0"));
        }
        if self.min_tracked == 0 {
            return Err(ReelswipeError::config(
                "optical_flow.min_tracked must be >= 1",
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Missing keys take their defaults.
    pub fn load_from(path: &Path) -> ReelswipeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> ReelswipeResult<PathBuf> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ReelswipeResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl DetectorSettings {
    /// Strategy name, defaulting to the foreground backend when unset.
    pub fn strategy_name(&self) -> &str {
        if self.strategy.trim().is_empty() {
            "foreground"
        } else {
            self.strategy.trim()
        }
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelswipe").join("config.json")
}
