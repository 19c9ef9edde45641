//! Rate limit manager implementation.

use std::time::{Duration, Instant};

use config::RateLimitConfig;
use telemetry::RateLimitRecorder;

use crate::clock::{Clock, SystemClock};
use crate::error::RateLimitError;
use crate::key::RateKey;
use crate::status::{Decision, RateLimitStatus};
use crate::storage::{QuotaStore, Storage};
use crate::window::{QuotaWindow, WindowState};

/// Fixed-window rate limiter keyed by route and client.
///
/// Every key gets `max_requests` requests per window. The window opens on the key's first
/// checked request and rolls over lazily, on the first access after it has elapsed; there is
/// no background timer. Windows live in the store handed over at construction, so separate
/// managers never share counts.
pub struct RateLimitManager<S = Storage, C = SystemClock> {
    enabled: bool,
    limit: u32,
    window: Duration,
    store: S,
    clock: C,
    metrics: RateLimitRecorder,
}

impl RateLimitManager {
    /// Create a manager with the storage backend selected in `config` and the system clock.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_store(config, Storage::from_config(config), SystemClock)
    }
}

impl<S, C> RateLimitManager<S, C>
where
    S: QuotaStore,
    C: Clock,
{
    /// Create a manager around an explicit store and clock.
    pub fn with_store(config: &RateLimitConfig, store: S, clock: C) -> Self {
        log::debug!(
            "Rate limiter configured: enabled={}, {} requests per {:?}",
            config.enabled,
            config.max_requests,
            config.window
        );

        Self {
            enabled: config.enabled,
            limit: config.max_requests,
            window: config.window,
            store,
            clock,
            metrics: RateLimitRecorder::global(),
        }
    }

    /// Whether requests are counted at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Requests allowed per key and window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// The current instant according to the manager's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Count a request for `key` and decide whether it may proceed.
    ///
    /// Exactly `limit` requests are allowed per window; every later request in the same
    /// window is rejected without being counted. A disabled manager allows everything and
    /// counts nothing.
    pub fn check(&self, key: &RateKey) -> Decision {
        let now = self.clock.now();

        if !self.enabled {
            return Decision::Allowed(self.status_at(key, now));
        }

        let (decision, state, rolled_over) = self.store.update(key, |slot| {
            let window = slot.get_or_insert_with(|| QuotaWindow::new(now, self.limit, self.window));
            let rolled_over = window.roll_over(now);

            let decision = if window.try_consume() {
                Decision::Allowed(RateLimitStatus::from(&*window))
            } else {
                Decision::Rejected(RateLimitStatus::from(&*window))
            };

            (decision, window.state(), rolled_over)
        });

        if rolled_over {
            log::debug!("Window for key '{key}' elapsed, started a new one");
        }

        match decision {
            Decision::Allowed(status) if state == WindowState::Saturated => {
                log::debug!("Key '{key}' used its last request of the window ({} allowed)", status.limit);
            }
            Decision::Allowed(status) => {
                log::debug!("Request allowed for key '{key}', {} remaining", status.remaining);
            }
            Decision::Rejected(status) => {
                log::debug!(
                    "Request blocked for key '{key}' - rate limit exceeded, retry after {:?}",
                    status.reset_after(now)
                );
            }
        }

        self.metrics.record_request(decision.outcome());

        decision
    }

    /// Count a request for the route and client pair.
    ///
    /// Returns the quota left after counting it, or [`RateLimitError::LimitExceeded`] when the
    /// window is already saturated.
    pub fn check_rate_limit(&self, route: &str, client_id: &str) -> Result<RateLimitStatus, RateLimitError> {
        let key = RateKey::new(route, client_id)?;

        match self.check(&key) {
            Decision::Allowed(status) => Ok(status),
            Decision::Rejected(status) => {
                let retry_after = status.reset_after(self.clock.now());

                Err(RateLimitError::LimitExceeded {
                    key,
                    reset_time: status.reset_time,
                    retry_after,
                })
            }
        }
    }

    /// Report the quota of `key` without counting anything.
    ///
    /// A key that was never checked, or whose window has elapsed, reports no usage and a full
    /// window starting now. Reading never creates a window.
    pub fn status(&self, key: &RateKey) -> RateLimitStatus {
        self.status_at(key, self.clock.now())
    }

    /// Report the quota of the route and client pair without counting anything.
    pub fn rate_limit_status(&self, route: &str, client_id: &str) -> Result<RateLimitStatus, RateLimitError> {
        let key = RateKey::new(route, client_id)?;
        Ok(self.status(&key))
    }

    /// Forget the window of `key`. Returns whether one existed.
    pub fn reset(&self, key: &RateKey) -> bool {
        let existed = self.store.delete(key).is_some();

        if existed {
            log::debug!("Rate limit window for key '{key}' reset");
        }

        existed
    }

    /// Forget the window of the route and client pair.
    pub fn reset_rate_limit(&self, route: &str, client_id: &str) -> Result<bool, RateLimitError> {
        let key = RateKey::new(route, client_id)?;
        Ok(self.reset(&key))
    }

    /// Drop every window that has elapsed. Returns how many were dropped.
    ///
    /// Rollover is lazy, so keys that stop sending requests keep their last window until
    /// purged. Call this periodically when client identifiers are unbounded.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let removed = self.store.purge(|window| window.has_elapsed(now));

        if removed > 0 {
            log::debug!("Purged {removed} expired rate limit windows");
        }

        self.metrics.record_purged(removed);

        removed
    }

    /// Number of keys with a stored window.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether no key has a stored window.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn status_at(&self, key: &RateKey, now: Instant) -> RateLimitStatus {
        match self.store.get(key) {
            Some(window) if !window.has_elapsed(now) => RateLimitStatus::from(&window),
            _ => RateLimitStatus::unused(now, self.limit, self.window),
        }
    }
}
