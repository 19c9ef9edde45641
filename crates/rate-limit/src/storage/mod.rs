//! Storage backends for quota windows.

pub mod bounded;
pub mod memory;

pub use bounded::BoundedStore;
pub use memory::InMemoryStore;

use config::{RateLimitConfig, StorageConfig};

use crate::key::RateKey;
use crate::window::QuotaWindow;

/// Owner of every quota window.
///
/// Implementations must make [`QuotaStore::update`] a critical section for its key: no other
/// `update` of the same key may interleave with it. That is what keeps the get, check and
/// increment of a request atomic when callers run on several threads.
pub trait QuotaStore: Send + Sync {
    /// The window stored for `key`.
    fn get(&self, key: &RateKey) -> Option<QuotaWindow>;

    /// Store `window` for `key`, replacing any previous one.
    fn set(&self, key: RateKey, window: QuotaWindow);

    /// Forget `key`, returning its window.
    fn delete(&self, key: &RateKey) -> Option<QuotaWindow>;

    /// Run `f` on the slot of `key`. Whatever the slot holds afterwards is stored; `None`
    /// removes the key.
    fn update<R>(&self, key: &RateKey, f: impl FnOnce(&mut Option<QuotaWindow>) -> R) -> R;

    /// Remove every window matching `expired`, returning how many were removed.
    fn purge(&self, expired: impl Fn(&QuotaWindow) -> bool) -> usize;

    /// Number of stored windows.
    fn len(&self) -> usize;

    /// Whether no window is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Store selected from configuration.
pub enum Storage {
    /// Unbounded map.
    Memory(InMemoryStore),
    /// Capacity-bounded cache.
    Bounded(BoundedStore),
}

impl Storage {
    /// Build the store described by `config.storage`.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        match &config.storage {
            StorageConfig::Memory => {
                log::debug!("Using unbounded in-memory quota storage");
                Storage::Memory(InMemoryStore::new())
            }
            StorageConfig::Bounded(bounded) => {
                let idle_timeout = bounded.idle_timeout.unwrap_or(config.window);

                log::debug!(
                    "Using bounded quota storage: max_keys={}, idle_timeout={idle_timeout:?}",
                    bounded.max_keys
                );

                Storage::Bounded(BoundedStore::new(bounded.max_keys, idle_timeout))
            }
        }
    }
}

impl QuotaStore for Storage {
    fn get(&self, key: &RateKey) -> Option<QuotaWindow> {
        match self {
            Storage::Memory(store) => store.get(key),
            Storage::Bounded(store) => store.get(key),
        }
    }

    fn set(&self, key: RateKey, window: QuotaWindow) {
        match self {
            Storage::Memory(store) => store.set(key, window),
            Storage::Bounded(store) => store.set(key, window),
        }
    }

    fn delete(&self, key: &RateKey) -> Option<QuotaWindow> {
        match self {
            Storage::Memory(store) => store.delete(key),
            Storage::Bounded(store) => store.delete(key),
        }
    }

    fn update<R>(&self, key: &RateKey, f: impl FnOnce(&mut Option<QuotaWindow>) -> R) -> R {
        match self {
            Storage::Memory(store) => store.update(key, f),
            Storage::Bounded(store) => store.update(key, f),
        }
    }

    fn purge(&self, expired: impl Fn(&QuotaWindow) -> bool) -> usize {
        match self {
            Storage::Memory(store) => store.purge(expired),
            Storage::Bounded(store) => store.purge(expired),
        }
    }

    fn len(&self) -> usize {
        match self {
            Storage::Memory(store) => store.len(),
            Storage::Bounded(store) => store.len(),
        }
    }
}
