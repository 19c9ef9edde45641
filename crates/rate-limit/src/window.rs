//! Per-key fixed window state.

use std::time::{Duration, Instant};

/// Where a window stands relative to its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// No request counted yet.
    Fresh,
    /// Some requests counted, more are allowed.
    Accumulating,
    /// The limit is reached. Requests are rejected until the window rolls over.
    Saturated,
}

/// Request count for one key in the current fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaWindow {
    count: u32,
    window_start: Instant,
    limit: u32,
    window_size: Duration,
}

impl QuotaWindow {
    /// Open an empty window starting at `now`.
    pub fn new(now: Instant, limit: u32, window_size: Duration) -> Self {
        Self {
            count: 0,
            window_start: now,
            limit,
            window_size,
        }
    }

    /// Requests counted in this window.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// When the window opened.
    pub fn window_start(&self) -> Instant {
        self.window_start
    }

    /// Requests allowed per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length.
    pub fn window_size(&self) -> Duration {
        self.window_size
    }

    /// Requests still allowed in this window.
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }

    /// When the window closes and the count starts over.
    pub fn reset_time(&self) -> Instant {
        self.window_start + self.window_size
    }

    /// True once a full window length has passed since the window opened.
    pub fn has_elapsed(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.window_start) >= self.window_size
    }

    /// Start a new window at `now` if the current one has elapsed. Returns whether it did.
    pub fn roll_over(&mut self, now: Instant) -> bool {
        if !self.has_elapsed(now) {
            return false;
        }

        self.count = 0;
        self.window_start = now;

        true
    }

    /// Count one request if the limit allows it. A rejected request is not counted.
    pub fn try_consume(&mut self) -> bool {
        if self.count >= self.limit {
            return false;
        }

        self.count += 1;

        true
    }

    /// The window's position in the `Fresh -> Accumulating -> Saturated` cycle.
    pub fn state(&self) -> WindowState {
        match self.count {
            0 => WindowState::Fresh,
            count if count >= self.limit => WindowState::Saturated,
            _ => WindowState::Accumulating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn consumes_exactly_limit_requests() {
        let mut window = QuotaWindow::new(Instant::now(), 3, MINUTE);

        assert!(window.try_consume());
        assert!(window.try_consume());
        assert!(window.try_consume());
        assert!(!window.try_consume());

        assert_eq!(window.count(), 3);
        assert_eq!(window.remaining(), 0);
    }

    #[test]
    fn walks_through_states() {
        let now = Instant::now();
        let mut window = QuotaWindow::new(now, 2, MINUTE);
        assert_eq!(window.state(), WindowState::Fresh);

        window.try_consume();
        assert_eq!(window.state(), WindowState::Accumulating);

        window.try_consume();
        assert_eq!(window.state(), WindowState::Saturated);

        window.try_consume();
        assert_eq!(window.state(), WindowState::Saturated);

        assert!(window.roll_over(now + MINUTE));
        assert_eq!(window.state(), WindowState::Fresh);
    }

    #[test]
    fn rolls_over_at_window_boundary() {
        let start = Instant::now();
        let mut window = QuotaWindow::new(start, 1, MINUTE);
        window.try_consume();

        assert!(!window.roll_over(start + MINUTE - Duration::from_millis(1)));
        assert_eq!(window.count(), 1);

        let boundary = start + MINUTE;
        assert!(window.roll_over(boundary));
        assert_eq!(window.count(), 0);
        assert_eq!(window.window_start(), boundary);
        assert_eq!(window.reset_time(), boundary + MINUTE);
    }

    #[test]
    fn earlier_instant_never_rolls_over() {
        let start = Instant::now() + MINUTE;
        let mut window = QuotaWindow::new(start, 1, MINUTE);

        assert!(!window.has_elapsed(start - Duration::from_secs(1)));
        assert!(!window.roll_over(start - Duration::from_secs(1)));
    }
}
