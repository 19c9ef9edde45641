//! Instrument names and attribute keys.

/// Counter of requests checked by the rate limiter.
pub const RATE_LIMIT_REQUESTS: &str = "rate_limit.requests";

/// Outcome attribute on [`RATE_LIMIT_REQUESTS`]: `allowed` or `rejected`.
pub const RATE_LIMIT_OUTCOME: &str = "rate_limit.outcome";

/// Counter of elapsed windows dropped by a purge.
pub const RATE_LIMIT_WINDOWS_PURGED: &str = "rate_limit.windows.purged";
