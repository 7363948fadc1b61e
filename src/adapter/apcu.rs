use std::rc::Rc;
use std::time::Duration;

use crate::error::Result;
use crate::reflection::{Reflection, ReflectionData};

use super::{AdapterOptions, CacheBackend, SharedCache};

/// Namespace of every key this backend writes.
const KEY_PREFIX: &str = "_PHAN";

/// Backend over a [`SharedCache`].
///
/// Entries are stored as the JSON form of their [`ReflectionData`]
/// under `lowercase("_PHAN" + prefix + class)` and expire after the
/// configured lifetime.
#[derive(Debug, Clone)]
pub struct Apcu {
    prefix: String,
    lifetime: Duration,
    cache: SharedCache,
}

impl Apcu {
    /// A backend writing to [`SharedCache::global`].
    pub fn new(options: &AdapterOptions) -> Self {
        Apcu::with_cache(options, SharedCache::global())
    }

    pub fn with_cache(options: &AdapterOptions, cache: SharedCache) -> Self {
        Apcu {
            prefix: options.prefix.clone(),
            lifetime: Duration::from_secs(options.lifetime),
            cache,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    fn key(&self, class_name: &str) -> String {
        format!("{KEY_PREFIX}{}{class_name}", self.prefix).to_lowercase()
    }
}

impl CacheBackend for Apcu {
    /// An entry that no longer decodes is dropped and reported as a miss.
    fn read(&mut self, key: &str) -> Result<Option<Rc<Reflection>>> {
        let key = self.key(key);
        let Some(payload) = self.cache.fetch(&key) else {
            return Ok(None);
        };
        match ReflectionData::from_json(&payload) {
            Ok(data) => Ok(Some(Rc::new(Reflection::new(data)))),
            Err(e) => {
                tracing::warn!("discarding unreadable cache entry {}: {}", key, e);
                self.cache.delete(&key);
                Ok(None)
            }
        }
    }

    fn write(&mut self, key: &str, reflection: &Rc<Reflection>) -> Result<bool> {
        let payload = serde_json::to_string(reflection.reflection_data())?;
        Ok(self.cache.store(&self.key(key), payload, self.lifetime))
    }
}
