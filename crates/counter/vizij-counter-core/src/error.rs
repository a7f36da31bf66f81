//! Error types for counter registration, configuration and frame writes.
//!
//! None of these ever reach the page: the fail-silent entry points log them and
//! degrade to "leave the number static".

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CounterError {
    /// The source text holds no run of decimal digits.
    #[error("no digits in counter text {text:?}")]
    NoDigits { text: String },

    /// The selected digit run is preceded by a minus sign.
    #[error("negative counter value in {text:?}")]
    Negative { text: String },

    /// The digit run does not fit the exact integer range of a frame computation.
    #[error("counter value {digits} exceeds {max}")]
    Overflow { digits: String, max: u64 },

    /// Duration must be finite and strictly positive.
    #[error("invalid duration: {duration_ms} ms")]
    InvalidDuration { duration_ms: f64 },

    /// Configuration JSON did not deserialize.
    #[error("invalid counter config: {reason}")]
    InvalidConfig { reason: String },

    /// Visibility threshold must lie in 0.0..=1.0.
    #[error("invalid visibility threshold: {threshold}")]
    InvalidThreshold { threshold: f32 },

    /// Another counter already owns this handle.
    #[error("element {handle:?} already has a counter")]
    Duplicate { handle: String },

    /// The host element is gone (removed from the document) or its handle is stale.
    #[error("element {handle:?} is detached")]
    Detached { handle: String },
}

impl CounterError {
    /// Parse failures and detached writes are recovered by skipping the target.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoDigits { .. }
                | Self::Negative { .. }
                | Self::Overflow { .. }
                | Self::Duplicate { .. }
                | Self::Detached { .. }
        )
    }

    /// Error category for logging.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::NoDigits { .. } | Self::Negative { .. } | Self::Overflow { .. } => "parse",
            Self::InvalidConfig { .. }
            | Self::InvalidDuration { .. }
            | Self::InvalidThreshold { .. } => "config",
            Self::Duplicate { .. } | Self::Detached { .. } => "host",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let parse = CounterError::NoDigits { text: "N/A".into() };
        assert_eq!(parse.category(), "parse");
        assert!(parse.is_recoverable());

        let cfg = CounterError::InvalidDuration { duration_ms: 0.0 };
        assert_eq!(cfg.category(), "config");
        assert!(!cfg.is_recoverable());

        let dup = CounterError::Duplicate { handle: "x".into() };
        assert_eq!(dup.category(), "host");
        assert!(dup.is_recoverable());
    }

    #[test]
    fn display_mentions_text() {
        let err = CounterError::Negative { text: "-5".into() };
        assert_eq!(err.to_string(), "negative counter value in \"-5\"");
    }
}
