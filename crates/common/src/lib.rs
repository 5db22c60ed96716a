//! ReelSwipe Common Utilities
//!
//! Shared infrastructure for all ReelSwipe crates:
//! - Error types and result aliases
//! - Session and replay clocks for frame timestamps
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
