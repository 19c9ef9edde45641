//! Quota reports handed back to callers.

use std::time::{Duration, Instant};

use telemetry::Outcome;

use crate::window::QuotaWindow;

/// Snapshot of a key's quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests counted in the current window.
    pub current: u32,
    /// Requests still allowed in the current window.
    pub remaining: u32,
    /// When the current window closes.
    pub reset_time: Instant,
}

impl RateLimitStatus {
    /// Status of a key with no live window: nothing used, a full window ahead.
    pub(crate) fn unused(now: Instant, limit: u32, window_size: Duration) -> Self {
        Self {
            limit,
            current: 0,
            remaining: limit,
            reset_time: now + window_size,
        }
    }

    /// Time left until the window closes, zero if it already has.
    pub fn reset_after(&self, now: Instant) -> Duration {
        self.reset_time.saturating_duration_since(now)
    }
}

impl From<&QuotaWindow> for RateLimitStatus {
    fn from(window: &QuotaWindow) -> Self {
        Self {
            limit: window.limit(),
            current: window.count(),
            remaining: window.remaining(),
            reset_time: window.reset_time(),
        }
    }
}

/// Outcome of checking one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request was counted and may proceed.
    Allowed(RateLimitStatus),
    /// The window is saturated. Nothing was counted.
    Rejected(RateLimitStatus),
}

impl Decision {
    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed(_))
    }

    /// The quota after the decision.
    pub fn status(&self) -> &RateLimitStatus {
        match self {
            Decision::Allowed(status) | Decision::Rejected(status) => status,
        }
    }

    /// The outcome reported to metrics.
    pub fn outcome(&self) -> Outcome {
        match self {
            Decision::Allowed(_) => Outcome::Allowed,
            Decision::Rejected(_) => Outcome::Rejected,
        }
    }
}
