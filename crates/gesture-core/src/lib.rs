//! ReelSwipe Gesture Core: camera motion to navigation actions
//!
//! Turns a stream of color frames into discrete NEXT / PREV actions:
//! - **Motion extraction:** background-subtraction contour centroid or
//!   sparse optical flow, behind one [`MotionExtractor`] trait
//! - **Tracking:** a bounded window of normalized, timestamped positions
//! - **Classification:** displacement, duration, axis, consistency and
//!   cooldown gates with optional vote confirmation
//!
//! This crate is pure computation. Frames come in, actions go out; camera
//! capture and key emission belong to the caller.

pub mod action;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod motion;
pub mod tracker;

pub use action::Action;
pub use classifier::{Classification, ClassifierState, SwipeClassifier, SwipeRejection};
pub use config::{Axis, ClassifierPolicy, Confirmation, SwipeConfig};
pub use controller::{FrameOutcome, GestureController};
pub use motion::{build_extractor, ExtractorKind, MotionExtractor, MotionSample};
pub use tracker::{NormalizedPoint, PositionTracker};
