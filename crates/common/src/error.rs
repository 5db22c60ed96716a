//! Error types shared across ReelSwipe crates.

/// Top-level error type for ReelSwipe operations.
#[derive(Debug, thiserror::Error)]
pub enum ReelswipeError {
    /// Invalid configuration. Raised at construction, never mid-session.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A single frame could not be analysed. The session carries on.
    #[error("Frame error: {message}")]
    Frame { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelswipeError.
pub type ReelswipeResult<T> = Result<T, ReelswipeError>;

impl ReelswipeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error only affects the current frame.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Frame { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_errors_are_transient() {
        assert!(ReelswipeError::frame("empty frame").is_transient());
        assert!(!ReelswipeError::config("history < 2").is_transient());
        assert!(!ReelswipeError::unsupported("optical-flow").is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = ReelswipeError::config("cooldown must be >= 0");
        assert_eq!(err.to_string(), "Configuration error: cooldown must be >= 0");
    }
}
