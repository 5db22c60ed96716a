//! Key bindings reported for each action.
//!
//! The CLI never presses keys; it prints what a key emitter would send.

use std::str::FromStr;

use reelswipe_gesture::Action;

/// Named key binding presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyScheme {
    /// Down / Up arrows.
    #[default]
    Arrows,
    /// S / W.
    Wasd,
    /// Vi-style J / K.
    Jk,
    /// Space / Shift+Space.
    Space,
}

impl KeyScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arrows => "arrows",
            Self::Wasd => "wasd",
            Self::Jk => "jk",
            Self::Space => "space",
        }
    }

    /// Key for `action`, or `None` when the action has no binding.
    pub fn key_for(&self, action: Action) -> Option<&'static str> {
        let (next, prev) = match self {
            Self::Arrows => ("down", "up"),
            Self::Wasd => ("s", "w"),
            Self::Jk => ("j", "k"),
            Self::Space => ("space", "shift+space"),
        };
        match action {
            Action::Next => Some(next),
            Action::Prev => Some(prev),
            Action::Pause => None,
        }
    }
}

impl FromStr for KeyScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arrows" | "arrow" => Ok(Self::Arrows),
            "wasd" => Ok(Self::Wasd),
            "jk" | "vi" => Ok(Self::Jk),
            "space" => Ok(Self::Space),
            other => anyhow::bail!(
                "unknown key scheme '{other}' (expected arrows, wasd, jk or space)"
            ),
        }
    }
}

impl std::fmt::Display for KeyScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
