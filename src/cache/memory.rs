use super::CacheBackend;
use crate::{Error, Result};
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process backend for single-instance deployments and tests.
/// Least-recently-used entries are evicted past `capacity`; expired
/// entries are dropped on access.
pub struct MemoryBackend {
    entries: Mutex<LruCache<String, Entry>>,
}

impl MemoryBackend {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut LruCache<String, Entry>) -> T) -> Result<T> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| Error::cache(format!("Failed to lock memory cache: {}", e)))?;
        Ok(f(&mut entries))
    }

    fn live_value(entries: &mut LruCache<String, Entry>, key: &str) -> Option<String> {
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        None
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_entries(|entries| Self::live_value(entries, key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.with_entries(|entries| {
            entries.put(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at: Instant::now() + ttl,
                },
            );
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.with_entries(|entries| {
            entries.pop(key);
        })
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.with_entries(|entries| Self::live_value(entries, key).is_some())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
