//! Clock and timer error types.

use thiserror::Error;

use crate::domain::shared::UnixNanos;

/// Clock and timer errors.
#[derive(Debug, Error)]
pub enum ClockError {
    /// No timer registered under the given name.
    #[error("timer not found: {0}")]
    TimerNotFound(String),

    /// Timer parameters are invalid.
    #[error("invalid timer '{name}': {message}")]
    InvalidTimer {
        /// Timer name.
        name: String,
        /// What was wrong.
        message: String,
    },

    /// An advance would move time backwards.
    #[error("time cannot move backwards: current {current}, target {target}")]
    TimeBackwards {
        /// Current clock time.
        current: UnixNanos,
        /// Requested target time.
        target: UnixNanos,
    },
}
