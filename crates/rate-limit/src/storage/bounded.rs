//! Capacity-bounded quota storage using the mini-moka cache.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use mini_moka::sync::{Cache, ConcurrentCacheExt};

use super::QuotaStore;
use crate::key::RateKey;
use crate::window::QuotaWindow;

/// Quota storage that keeps at most `max_keys` windows and drops keys left idle.
///
/// Meant for deployments where client identifiers come from untrusted input (raw IP
/// addresses, for example) and the unbounded store could grow without limit. The idle
/// timeout must not be shorter than the window, otherwise a live window could be evicted and
/// its quota restored early.
pub struct BoundedStore {
    windows: Cache<RateKey, QuotaWindow>,
    /// Serializes read-modify-write sequences. The cache has no per-entry locking.
    update_lock: Mutex<()>,
}

impl BoundedStore {
    /// Create a store holding up to `max_keys` windows, each evicted after `idle_timeout`
    /// without access.
    pub fn new(max_keys: u64, idle_timeout: Duration) -> Self {
        let windows = Cache::builder()
            .max_capacity(max_keys)
            .time_to_idle(idle_timeout)
            .build();

        Self {
            windows,
            update_lock: Mutex::new(()),
        }
    }
}

impl QuotaStore for BoundedStore {
    fn get(&self, key: &RateKey) -> Option<QuotaWindow> {
        self.windows.get(key)
    }

    fn set(&self, key: RateKey, window: QuotaWindow) {
        self.windows.insert(key, window);
    }

    fn delete(&self, key: &RateKey) -> Option<QuotaWindow> {
        let _guard = self.update_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let window = self.windows.get(key);
        self.windows.invalidate(key);

        window
    }

    fn update<R>(&self, key: &RateKey, f: impl FnOnce(&mut Option<QuotaWindow>) -> R) -> R {
        let _guard = self.update_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut slot = self.windows.get(key);
        let existed = slot.is_some();
        let result = f(&mut slot);

        match slot {
            Some(window) => self.windows.insert(key.clone(), window),
            None if existed => self.windows.invalidate(key),
            None => (),
        }

        result
    }

    fn purge(&self, expired: impl Fn(&QuotaWindow) -> bool) -> usize {
        let _guard = self.update_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let keys: Vec<RateKey> = self
            .windows
            .iter()
            .filter(|entry| expired(entry.value()))
            .map(|entry| entry.key().clone())
            .collect();

        for key in &keys {
            self.windows.invalidate(key);
        }

        keys.len()
    }

    fn len(&self) -> usize {
        // The entry count is maintained by deferred housekeeping and lags behind writes.
        self.windows.sync();

        usize::try_from(self.windows.entry_count()).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;
    use std::time::Instant;

    use super::*;

    fn key(client: &str) -> RateKey {
        RateKey::new("/api/test", client).unwrap()
    }

    fn store() -> BoundedStore {
        BoundedStore::new(100, Duration::from_secs(60))
    }

    #[test]
    fn get_set_delete() {
        let store = store();
        let window = QuotaWindow::new(Instant::now(), 3, Duration::from_secs(60));

        store.set(key("a"), window);
        assert_eq!(store.get(&key("a")), Some(window));

        assert_eq!(store.delete(&key("a")), Some(window));
        assert!(store.get(&key("a")).is_none());
    }

    #[test]
    fn update_is_read_modify_write() {
        let store = store();
        let now = Instant::now();

        for _ in 0..3 {
            store.update(&key("a"), |slot| {
                slot.get_or_insert(QuotaWindow::new(now, 3, Duration::from_secs(60)))
                    .try_consume()
            });
        }

        let rejected = store.update(&key("a"), |slot| slot.as_mut().map(QuotaWindow::try_consume));

        assert_eq!(rejected, Some(false));
        assert_eq!(store.get(&key("a")).map(|w| w.count()), Some(3));
    }

    #[test]
    fn purge_removes_matching_windows() {
        let store = store();
        let now = Instant::now();
        let later = now + Duration::from_secs(120);

        store.set(key("old"), QuotaWindow::new(now, 1, Duration::from_secs(60)));
        store.set(key("new"), QuotaWindow::new(later, 1, Duration::from_secs(60)));

        let removed = store.purge(|window| window.has_elapsed(later));

        assert_eq!(removed, 1);
        assert!(store.get(&key("old")).is_none());
        assert!(store.get(&key("new")).is_some());
    }

    #[test]
    fn len_counts_fresh_writes() {
        let store = store();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());

        store.update(&key("a"), |slot| {
            slot.get_or_insert(QuotaWindow::new(Instant::now(), 3, Duration::from_secs(60)))
                .try_consume()
        });

        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());

        store.set(key("b"), QuotaWindow::new(Instant::now(), 3, Duration::from_secs(60)));
        assert_eq!(store.len(), 2);

        store.delete(&key("a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn key_count_stays_within_capacity() {
        let store = BoundedStore::new(4, Duration::from_secs(60));
        let now = Instant::now();

        for i in 0..64 {
            store.set(key(&format!("ip-{i}")), QuotaWindow::new(now, 1, Duration::from_secs(60)));
        }

        assert!(store.len() <= 4, "len = {}", store.len());
    }

    #[test]
    fn idle_windows_are_evicted() {
        let store = BoundedStore::new(100, Duration::from_millis(100));

        store.set(key("a"), QuotaWindow::new(Instant::now(), 1, Duration::from_millis(100)));
        sleep(Duration::from_millis(250));

        assert!(store.get(&key("a")).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn updates_keep_a_window_alive() {
        let store = BoundedStore::new(100, Duration::from_millis(300));
        let now = Instant::now();

        for _ in 0..6 {
            store.update(&key("a"), |slot| {
                slot.get_or_insert(QuotaWindow::new(now, 100, Duration::from_secs(60)))
                    .try_consume()
            });
            sleep(Duration::from_millis(60));
        }

        assert_eq!(store.get(&key("a")).map(|w| w.count()), Some(6));
    }
}
