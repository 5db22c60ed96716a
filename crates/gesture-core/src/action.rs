//! Navigation actions produced by the gesture pipeline.

use serde::{Deserialize, Serialize};

/// Discrete outcome of a confirmed swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Advance (swipe down on the vertical axis, right on the horizontal one).
    Next,
    /// Go back.
    Prev,
    /// Reserved for a pause/play toggle. Never produced by the classifier.
    Pause,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Prev => "prev",
            Self::Pause => "pause",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
