//! Error types for rate limiting.

use std::time::{Duration, Instant};

use crate::key::RateKey;

/// Errors that can occur during rate limiting.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// The key's window is saturated.
    #[error("Rate limit exceeded for {key}, retry after {retry_after:?}")]
    LimitExceeded {
        /// The saturated key.
        key: RateKey,
        /// When the window closes.
        reset_time: Instant,
        /// Time to wait before retrying.
        retry_after: Duration,
    },

    /// The route or client identifier cannot identify a bucket.
    #[error("Invalid rate limit argument: {0}")]
    InvalidArgument(&'static str),
}

impl RateLimitError {
    /// Get the retry-after duration if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::LimitExceeded { retry_after, .. } => Some(*retry_after),
            Self::InvalidArgument(_) => None,
        }
    }
}
