//! Identity of a quota bucket.

use std::fmt;

use crate::error::RateLimitError;

/// Client identifier used when the caller has no identity of its own.
pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// A route and client pair. Each pair owns one independent quota window.
///
/// Two keys are equal only when both parts match exactly, so `("a:b", "c")` and
/// `("a", "b:c")` never share a bucket even though they print the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RateKey {
    route: String,
    client_id: String,
}

impl RateKey {
    /// Create a key, rejecting empty routes and client identifiers.
    pub fn new(route: impl Into<String>, client_id: impl Into<String>) -> Result<Self, RateLimitError> {
        let route = route.into();
        let client_id = client_id.into();

        if route.is_empty() {
            return Err(RateLimitError::InvalidArgument("route must not be empty"));
        }

        if client_id.is_empty() {
            return Err(RateLimitError::InvalidArgument("client id must not be empty"));
        }

        Ok(Self { route, client_id })
    }

    /// Key for a caller without an identity. All such callers share one bucket per route.
    pub fn anonymous(route: impl Into<String>) -> Result<Self, RateLimitError> {
        Self::new(route, ANONYMOUS_CLIENT)
    }

    /// The protected route.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// The opaque client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.client_id, self.route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_puts_client_first() {
        let key = RateKey::new("/api/stations", "user-7").unwrap();
        assert_eq!(key.to_string(), "user-7:/api/stations");
    }

    #[test]
    fn anonymous_key() {
        let key = RateKey::anonymous("/api/bookings").unwrap();

        assert_eq!(key.client_id(), ANONYMOUS_CLIENT);
        assert_eq!(key.route(), "/api/bookings");
    }

    #[test]
    fn equality_is_per_part() {
        let left = RateKey::new("b:c", "a").unwrap();
        let right = RateKey::new("c", "a:b").unwrap();

        assert_eq!(left.to_string(), right.to_string());
        assert_ne!(left, right);
    }

    #[test]
    fn empty_route_is_rejected() {
        let error = RateKey::new("", "user").unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Invalid rate limit argument: route must not be empty");
    }

    #[test]
    fn empty_client_is_rejected() {
        let error = RateKey::new("/api/test", "").unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Invalid rate limit argument: client id must not be empty");
    }
}
