//! Error types for the accumulator

use thiserror::Error;

/// Result type for accumulator operations that can fail.
///
/// `E` is the error type of the caller's flush callback.
pub type Result<T, E> = std::result::Result<T, AccumulatorError<E>>;

/// Accumulator error types
#[derive(Error, Debug)]
pub enum AccumulatorError<E> {
    /// Flush callback failed; the accumulator kept its `pending` entries
    /// and the write that triggered the flush was not recorded.
    #[error("Flush failed, {pending} entries left pending")]
    Flush {
        pending: usize,
        #[source]
        source: E,
    },
}

impl<E> AccumulatorError<E> {
    /// Number of entries still held by the accumulator after the failure
    pub fn pending(&self) -> usize {
        match self {
            Self::Flush { pending, .. } => *pending,
        }
    }

    /// Borrow the error returned by the flush callback
    pub fn source_ref(&self) -> &E {
        match self {
            Self::Flush { source, .. } => source,
        }
    }

    /// Unwrap into the error returned by the flush callback
    pub fn into_source(self) -> E {
        match self {
            Self::Flush { source, .. } => source,
        }
    }
}

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Capacity of zero makes every insert observe a full accumulator
    #[error("Configuration error: capacity must be at least 1")]
    ZeroCapacity,

    /// Watermark is a percentage
    #[error("Configuration error: high watermark {0} exceeds 100")]
    Watermark(u8),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, thiserror::Error, PartialEq)]
    #[error("sink offline")]
    struct SinkOffline;

    #[test]
    fn test_flush_error_wraps_source() {
        let err = AccumulatorError::Flush {
            pending: 3,
            source: SinkOffline,
        };

        assert_eq!(err.to_string(), "Flush failed, 3 entries left pending");
        assert_eq!(err.pending(), 3);
        assert_eq!(err.source_ref(), &SinkOffline);
        assert_eq!(err.source().map(|s| s.to_string()), Some("sink offline".to_string()));
        assert_eq!(err.into_source(), SinkOffline);
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::Watermark(120).to_string(),
            "Configuration error: high watermark 120 exceeds 100"
        );
    }
}
