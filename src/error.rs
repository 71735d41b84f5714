//! Error types for reply-probe.

use thiserror::Error;

/// Main error type for reply-probe operations.
#[derive(Error, Debug)]
pub enum ReplyProbeError {
    /// Required configuration is missing.
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Delay range is inverted or negative.
    #[error("invalid delay range: min {min} must be <= max {max} and both >= 0")]
    InvalidDelayRange {
        min: f64,
        max: f64,
    },

    /// HTTP transport error.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Telegram API rejected a request.
    #[error("telegram API error: {0}")]
    Api(String),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,

    /// Inbound event channel closed.
    #[error("event channel closed")]
    ChannelClosed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for reply-probe operations.
pub type Result<T> = std::result::Result<T, ReplyProbeError>;
