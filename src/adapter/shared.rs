use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

static GLOBAL: LazyLock<SharedCache> = LazyLock::new(SharedCache::new);

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Thread-safe string store with per-entry expiry.
///
/// Clones share the same entries.  Each call takes the lock once, so
/// concurrent writers to one key race and the last write wins.
#[derive(Debug, Clone, Default)]
pub struct SharedCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl SharedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The store shared by the whole process.
    pub fn global() -> SharedCache {
        GLOBAL.clone()
    }

    /// The value under `key`, unless it is absent or expired.  Expired
    /// entries are dropped on the way.
    pub fn fetch(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Store `value` for `ttl`; a zero `ttl` never expires.
    pub fn store(&self, key: &str, value: impl Into<String>, ttl: Duration) -> bool {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Instant::now().checked_add(ttl)
        };
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value: value.into(),
                expires_at,
            },
        );
        true
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of entries, expired ones included until next touched.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
