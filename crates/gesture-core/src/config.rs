//! Validated swipe configuration and classifier policy.
//!
//! [`SwipeConfig`] holds the user-facing thresholds. [`ClassifierPolicy`]
//! holds the structural choices (sub-window size, consistency gate,
//! confirmation mode) that stay fixed for a whole session.

use std::str::FromStr;

use reelswipe_common::config::SwipeDefaults;
use reelswipe_common::error::{ReelswipeError, ReelswipeResult};
use serde::{Deserialize, Serialize};

/// Cross-axis motion must stay at or below this fraction of the
/// primary-axis motion.
pub const DEFAULT_CROSS_AXIS_RATIO: f64 = 0.8;

/// Straight-line / path-length ratio below which motion counts as erratic.
pub const DEFAULT_MIN_CONSISTENCY: f64 = 0.6;

/// Axis along which swipes are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Downward motion is NEXT (image y grows downward).
    #[default]
    Vertical,
    /// Rightward motion is NEXT.
    Horizontal,
}

impl FromStr for Axis {
    type Err = ReelswipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertical" | "v" => Ok(Self::Vertical),
            "horizontal" | "h" => Ok(Self::Horizontal),
            other => Err(ReelswipeError::config(format!(
                "unknown axis '{other}' (expected 'vertical' or 'horizontal')"
            ))),
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertical => f.write_str("vertical"),
            Self::Horizontal => f.write_str("horizontal"),
        }
    }
}

/// Immutable swipe thresholds. Construction fails on values that would
/// make classification impossible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeConfig {
    min_displacement: f64,
    max_duration: f64,
    axis: Axis,
    history: usize,
    cooldown: f64,
}

impl SwipeConfig {
    /// Build a validated configuration.
    ///
    /// - `min_displacement` in `(0, 1]` (fraction of the frame)
    /// - `max_duration` > 0 seconds
    /// - `history` >= 2 samples
    /// - `cooldown` >= 0 seconds
    pub fn new(
        min_displacement: f64,
        max_duration: f64,
        axis: Axis,
        history: usize,
        cooldown: f64,
    ) -> ReelswipeResult<Self> {
        if !(min_displacement > 0.0 && min_displacement <= 1.0) {
            return Err(ReelswipeError::config(format!(
                "min_displacement must be in (0, 1], got {min_displacement}"
            )));
        }
        if !(max_duration > 0.0 && max_duration.is_finite()) {
            return Err(ReelswipeError::config(format!(
                "max_duration must be a positive number of seconds, got {max_duration}"
            )));
        }
        if history < 2 {
            return Err(ReelswipeError::config(format!(
                "history must be >= 2 samples, got {history}"
            )));
        }
        if !(cooldown >= 0.0 && cooldown.is_finite()) {
            return Err(ReelswipeError::config(format!(
                "cooldown must be >= 0 seconds, got {cooldown}"
            )));
        }
        Ok(Self {
            min_displacement,
            max_duration,
            axis,
            history,
            cooldown,
        })
    }

    /// Build from on-disk settings.
    pub fn from_settings(settings: &SwipeDefaults) -> ReelswipeResult<Self> {
        Self::new(
            settings.min_displacement,
            settings.max_duration,
            settings.axis.parse()?,
            settings.history,
            settings.cooldown,
        )
    }

    /// Copy of this config measured along a different axis.
    pub fn with_axis(self, axis: Axis) -> Self {
        Self { axis, ..self }
    }

    pub fn min_displacement(&self) -> f64 {
        self.min_displacement
    }

    pub fn max_duration(&self) -> f64 {
        self.max_duration
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn history(&self) -> usize {
        self.history
    }

    pub fn cooldown(&self) -> f64 {
        self.cooldown
    }
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            min_displacement: 0.15,
            max_duration: 0.6,
            axis: Axis::Vertical,
            history: 5,
            cooldown: 0.8,
        }
    }
}

/// How a qualifying swipe becomes an emitted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Emit on the first qualifying frame.
    Immediate,
    /// Emit once the last `n` qualifying frames agree on a direction.
    Votes(usize),
}

/// Structural classifier choices, fixed for the lifetime of a controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierPolicy {
    /// Fewer samples than this in the window yields no decision.
    pub min_samples: usize,

    /// Only the newest `analysis_window` samples are inspected.
    pub analysis_window: usize,

    /// Minimum tracker capacity. The tracker holds the larger of this and
    /// `SwipeConfig::history`.
    pub tracker_capacity: Option<usize>,

    /// Reject when cross-axis motion exceeds this fraction of primary motion.
    pub cross_axis_ratio: f64,

    /// Reject when the straight-line ratio falls below this. `None` skips the gate.
    pub min_consistency: Option<f64>,

    pub confirmation: Confirmation,
}

impl ClassifierPolicy {
    /// Emit on first detection; displacement and axis gates only.
    pub fn immediate() -> Self {
        Self {
            min_samples: 2,
            analysis_window: 10,
            tracker_capacity: None,
            cross_axis_ratio: DEFAULT_CROSS_AXIS_RATIO,
            min_consistency: None,
            confirmation: Confirmation::Immediate,
        }
    }

    /// Longer window, consistency gate and three-vote confirmation.
    pub fn hardened() -> Self {
        Self {
            min_samples: 5,
            analysis_window: 10,
            tracker_capacity: Some(15),
            cross_axis_ratio: DEFAULT_CROSS_AXIS_RATIO,
            min_consistency: Some(DEFAULT_MIN_CONSISTENCY),
            confirmation: Confirmation::Votes(3),
        }
    }

    /// Capacity of the position tracker under this policy.
    pub fn tracker_capacity(&self, config: &SwipeConfig) -> usize {
        self.tracker_capacity
            .map_or(config.history(), |floor| floor.max(config.history()))
    }

    /// Check that the policy can produce a decision with the given config.
    pub fn validate(&self, config: &SwipeConfig) -> ReelswipeResult<()> {
        if self.min_samples < 2 {
            return Err(ReelswipeError::config("policy.min_samples must be >= 2"));
        }
        if self.analysis_window < self.min_samples {
            return Err(ReelswipeError::config(
                "policy.analysis_window must be >= min_samples",
            ));
        }
        if self.tracker_capacity(config) < self.min_samples {
            return Err(ReelswipeError::config(format!(
                "tracker capacity {} cannot hold the {} samples a decision needs",
                self.tracker_capacity(config),
                self.min_samples
            )));
        }
        if !(self.cross_axis_ratio > 0.0 && self.cross_axis_ratio <= 1.0) {
            return Err(ReelswipeError::config(
                "policy.cross_axis_ratio must be in (0, 1]",
            ));
        }
        if let Some(floor) = self.min_consistency {
            if !(floor > 0.0 && floor <= 1.0) {
                return Err(ReelswipeError::config(
                    "policy.min_consistency must be in (0, 1]",
                ));
            }
        }
        if let Confirmation::Votes(0) = self.confirmation {
            return Err(ReelswipeError::config("vote confirmation needs >= 1 vote"));
        }
        Ok(())
    }
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self::immediate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let d = SwipeConfig::default();
        let built = SwipeConfig::new(
            d.min_displacement(),
            d.max_duration(),
            d.axis(),
            d.history(),
            d.cooldown(),
        )
        .unwrap();
        assert_eq!(built, d);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(SwipeConfig::new(0.0, 0.6, Axis::Vertical, 5, 0.8).is_err());
        assert!(SwipeConfig::new(1.5, 0.6, Axis::Vertical, 5, 0.8).is_err());
        assert!(SwipeConfig::new(0.15, 0.0, Axis::Vertical, 5, 0.8).is_err());
        assert!(SwipeConfig::new(0.15, f64::INFINITY, Axis::Vertical, 5, 0.8).is_err());
        assert!(SwipeConfig::new(0.15, 0.6, Axis::Vertical, 1, 0.8).is_err());
        assert!(SwipeConfig::new(0.15, 0.6, Axis::Vertical, 5, -0.1).is_err());
        assert!(SwipeConfig::new(f64::NAN, 0.6, Axis::Vertical, 5, 0.8).is_err());
    }

    #[test]
    fn accepts_boundary_values() {
        assert!(SwipeConfig::new(1.0, 0.01, Axis::Horizontal, 2, 0.0).is_ok());
    }

    #[test]
    fn builds_from_settings() {
        let settings = SwipeDefaults {
            axis: "Horizontal".to_string(),
            ..Default::default()
        };
        let config = SwipeConfig::from_settings(&settings).unwrap();
        assert_eq!(config.axis(), Axis::Horizontal);
        assert_eq!(config.history(), 5);

        let bad = SwipeDefaults {
            axis: "diagonal".to_string(),
            ..Default::default()
        };
        assert!(SwipeConfig::from_settings(&bad).is_err());
    }

    #[test]
    fn built_in_policies_validate() {
        let config = SwipeConfig::default();
        assert!(ClassifierPolicy::immediate().validate(&config).is_ok());
        assert!(ClassifierPolicy::hardened().validate(&config).is_ok());
        assert_eq!(ClassifierPolicy::immediate().tracker_capacity(&config), 5);
        assert_eq!(ClassifierPolicy::hardened().tracker_capacity(&config), 15);
    }

    #[test]
    fn history_above_the_policy_floor_grows_the_tracker() {
        let config = SwipeConfig::new(0.15, 0.6, Axis::Vertical, 20, 0.8).unwrap();
        assert_eq!(ClassifierPolicy::hardened().tracker_capacity(&config), 20);
        assert_eq!(ClassifierPolicy::immediate().tracker_capacity(&config), 20);
    }

    #[test]
    fn policy_needing_more_samples_than_tracker_holds_is_rejected() {
        let config = SwipeConfig::new(0.15, 0.6, Axis::Vertical, 3, 0.8).unwrap();
        let policy = ClassifierPolicy {
            min_samples: 5,
            ..ClassifierPolicy::immediate()
        };
        assert!(policy.validate(&config).is_err());
    }

    #[test]
    fn zero_votes_rejected() {
        let policy = ClassifierPolicy {
            confirmation: Confirmation::Votes(0),
            ..ClassifierPolicy::hardened()
        };
        assert!(policy.validate(&SwipeConfig::default()).is_err());
    }
}
