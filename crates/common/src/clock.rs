//! Clock and timing utilities for frame timestamps.
//!
//! Gesture classification works on wall-clock seconds, not frame counts,
//! so capture rates may vary freely. This module provides:
//! - A monotonic session clock anchored at controller creation
//! - A fixed-rate frame clock for replaying recorded frames

use std::time::Instant;

/// A session clock that provides monotonic timestamps relative to
/// a fixed epoch (the moment the session started).
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// The instant the session started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new session clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Seconds elapsed since the session started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Re-anchor the clock to now.
    pub fn restart(&mut self) {
        *self = Self::start();
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::start()
    }
}

/// Timestamps for frames captured at a fixed rate.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    interval_secs: f64,
}

impl FrameClock {
    /// Create a clock for the given frames-per-second rate.
    ///
    /// Non-positive or non-finite rates fall back to 30 fps.
    pub fn new(fps: f64) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            30.0
        };
        Self {
            interval_secs: 1.0 / fps,
        }
    }

    /// Timestamp (seconds) of the frame at `index`.
    pub fn timestamp(&self, index: usize) -> f64 {
        index as f64 * self.interval_secs
    }

    /// Seconds between consecutive frames.
    pub fn interval_secs(&self) -> f64 {
        self.interval_secs
    }
}
