//! Bounded, time-ordered window of recent motion positions.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// A timestamped position normalized to the frame (`x = column / width`,
/// `y = row / height`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    /// Seconds on the session clock.
    pub t: f64,
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    /// Create a point, clamping coordinates into `[0, 1]`.
    pub fn new(t: f64, x: f64, y: f64) -> Self {
        Self {
            t,
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }

    /// Euclidean distance to another point, ignoring time.
    pub fn distance_to(&self, other: &NormalizedPoint) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// Fixed-capacity FIFO of positions. The oldest sample is evicted first.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    points: VecDeque<NormalizedPoint>,
    capacity: usize,
}

impl PositionTracker {
    /// Create an empty tracker. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when full.
    pub fn push(&mut self, point: NormalizedPoint) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Contiguous view of the window, oldest first, without copying.
    pub fn window(&mut self) -> &[NormalizedPoint] {
        self.points.make_contiguous()
    }

    /// Current window, oldest first.
    pub fn snapshot(&self) -> Vec<NormalizedPoint> {
        self.points.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NormalizedPoint> {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&NormalizedPoint> {
        self.points.back()
    }
}
