//! Fixed-window rate limiting keyed by route and client.
//!
//! Each `(route, client_id)` pair gets a fixed number of requests per window. Windows are kept
//! in a [`QuotaStore`] owned by the [`RateLimitManager`]:
//! - [`InMemoryStore`] keeps every key until it is purged,
//! - [`BoundedStore`] caps the number of keys and evicts idle ones.
//!
//! Rollover happens lazily when a key is next accessed, nothing runs in the background.

#![deny(missing_docs)]

mod clock;
mod error;
mod key;
mod manager;
mod status;
mod storage;
mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::RateLimitError;
pub use key::{ANONYMOUS_CLIENT, RateKey};
pub use manager::RateLimitManager;
pub use status::{Decision, RateLimitStatus};
pub use telemetry::Outcome;
pub use storage::{BoundedStore, InMemoryStore, QuotaStore, Storage};
pub use window::{QuotaWindow, WindowState};
