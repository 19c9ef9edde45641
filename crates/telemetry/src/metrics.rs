//! Rate limiter instruments.

mod names;

pub use names::*;

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Meter};

pub(crate) const METER_NAME: &str = "limiter";

/// What the limiter decided for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Allowed,
    Rejected,
}

impl Outcome {
    /// Value of the [`RATE_LIMIT_OUTCOME`] attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Allowed => "allowed",
            Outcome::Rejected => "rejected",
        }
    }
}

/// Counters updated by the rate limit manager.
#[derive(Clone)]
pub struct RateLimitRecorder {
    requests: Counter<u64>,
    windows_purged: Counter<u64>,
}

impl RateLimitRecorder {
    /// Recorder on the global meter provider installed by [`crate::init`].
    pub fn global() -> Self {
        Self::new(&opentelemetry::global::meter(METER_NAME))
    }

    pub fn new(meter: &Meter) -> Self {
        let requests = meter
            .u64_counter(RATE_LIMIT_REQUESTS)
            .with_description("Requests checked by the rate limiter")
            .build();

        let windows_purged = meter
            .u64_counter(RATE_LIMIT_WINDOWS_PURGED)
            .with_description("Elapsed rate limit windows dropped from storage")
            .build();

        Self {
            requests,
            windows_purged,
        }
    }

    pub fn record_request(&self, outcome: Outcome) {
        self.requests
            .add(1, &[KeyValue::new(RATE_LIMIT_OUTCOME, outcome.as_str())]);
    }

    pub fn record_purged(&self, windows: usize) {
        if windows > 0 {
            self.windows_purged.add(windows as u64, &[]);
        }
    }
}
