//! Unbounded in-memory quota storage.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::QuotaStore;
use crate::key::RateKey;
use crate::window::QuotaWindow;

/// Concurrent map from key to window. Keys stay until deleted or purged.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    windows: DashMap<RateKey, QuotaWindow>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuotaStore for InMemoryStore {
    fn get(&self, key: &RateKey) -> Option<QuotaWindow> {
        self.windows.get(key).map(|window| *window)
    }

    fn set(&self, key: RateKey, window: QuotaWindow) {
        self.windows.insert(key, window);
    }

    fn delete(&self, key: &RateKey) -> Option<QuotaWindow> {
        self.windows.remove(key).map(|(_, window)| window)
    }

    fn update<R>(&self, key: &RateKey, f: impl FnOnce(&mut Option<QuotaWindow>) -> R) -> R {
        // The entry holds the shard's write lock until it is dropped.
        match self.windows.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let mut slot = Some(*entry.get());
                let result = f(&mut slot);

                match slot {
                    Some(window) => *entry.get_mut() = window,
                    None => {
                        entry.remove();
                    }
                }

                result
            }
            Entry::Vacant(entry) => {
                let mut slot = None;
                let result = f(&mut slot);

                if let Some(window) = slot {
                    entry.insert(window);
                }

                result
            }
        }
    }

    fn purge(&self, expired: impl Fn(&QuotaWindow) -> bool) -> usize {
        let mut removed = 0;

        self.windows.retain(|_, window| {
            let keep = !expired(window);

            if !keep {
                removed += 1;
            }

            keep
        });

        removed
    }

    fn len(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn key(client: &str) -> RateKey {
        RateKey::new("/api/test", client).unwrap()
    }

    fn window(now: Instant) -> QuotaWindow {
        QuotaWindow::new(now, 5, Duration::from_secs(60))
    }

    #[test]
    fn get_set_delete() {
        let store = InMemoryStore::new();
        let now = Instant::now();

        assert!(store.get(&key("a")).is_none());

        store.set(key("a"), window(now));
        assert_eq!(store.get(&key("a")), Some(window(now)));
        assert_eq!(store.len(), 1);

        assert_eq!(store.delete(&key("a")), Some(window(now)));
        assert!(store.get(&key("a")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn update_creates_and_mutates() {
        let store = InMemoryStore::new();
        let now = Instant::now();

        let consumed = store.update(&key("a"), |slot| slot.get_or_insert(window(now)).try_consume());
        assert!(consumed);

        store.update(&key("a"), |slot| {
            if let Some(window) = slot {
                window.try_consume();
            }
        });

        assert_eq!(store.get(&key("a")).map(|w| w.count()), Some(2));
    }

    #[test]
    fn update_leaving_empty_slot_stores_nothing() {
        let store = InMemoryStore::new();

        store.update(&key("a"), |slot| assert!(slot.is_none()));

        assert!(store.is_empty());
    }

    #[test]
    fn update_clearing_slot_removes_key() {
        let store = InMemoryStore::new();
        store.set(key("a"), window(Instant::now()));

        store.update(&key("a"), |slot| *slot = None);

        assert!(store.get(&key("a")).is_none());
    }

    #[test]
    fn purge_removes_matching_windows() {
        let store = InMemoryStore::new();
        let now = Instant::now();
        let later = now + Duration::from_secs(120);

        store.set(key("old"), window(now));
        store.set(key("new"), window(later));

        let removed = store.purge(|window| window.has_elapsed(later));

        assert_eq!(removed, 1);
        assert!(store.get(&key("old")).is_none());
        assert!(store.get(&key("new")).is_some());
    }
}
