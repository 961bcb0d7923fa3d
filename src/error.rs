//! Error types for the reconnect coordinator

use thiserror::Error;

/// Result type alias using the crate error type
pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Smallest countdown a coordinator accepts, in seconds
pub const MIN_COUNTDOWN_SECONDS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// A countdown shorter than one second was requested
    #[error("Invalid countdown: {got}s (must be at least {min}s)")]
    InvalidCountdown { got: u32, min: u32 },

    /// Shared host state could not be locked
    #[error("Failed to lock {what}: {message}")]
    StateLock { what: &'static str, message: String },
}

impl CoordinatorError {
    pub fn invalid_countdown(got: u32) -> Self {
        Self::InvalidCountdown {
            got,
            min: MIN_COUNTDOWN_SECONDS,
        }
    }

    pub fn state_lock(what: &'static str, err: impl std::fmt::Display) -> Self {
        Self::StateLock {
            what,
            message: err.to_string(),
        }
    }
}
