use super::{CacheBackend, MemoryBackend, UpstashBackend};
use crate::{
    Error, Result,
    config::{CacheBackendKind, CacheConfig},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fail-open cache facade. Backend errors are logged and read back as a
/// miss (reads) or ignored (writes); nothing here can fail a request.
#[derive(Clone)]
pub struct CacheStore {
    backend: Option<Arc<dyn CacheBackend>>,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            backend: Some(backend),
            ttl,
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            ttl: Duration::ZERO,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let ttl = Duration::from_secs(config.ttl_secs);
        let store = match config.backend {
            CacheBackendKind::Upstash => {
                let (Some(url), Some(token)) = (&config.url, &config.token) else {
                    return Err(Error::config("upstash cache needs url and token"));
                };
                let backend = UpstashBackend::new(
                    url.clone(),
                    token.clone(),
                    Duration::from_millis(config.timeout_ms),
                )?;
                info!("Cache backend: upstash");
                Self::new(Arc::new(backend), ttl)
            }
            CacheBackendKind::Memory => {
                info!(
                    "Cache backend: in-process ({} entries)",
                    config.memory_capacity
                );
                Self::new(Arc::new(MemoryBackend::new(config.memory_capacity)), ttl)
            }
            CacheBackendKind::Disabled => {
                info!("Cache not configured - caching disabled");
                Self::disabled()
            }
        };
        Ok(store)
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// TTL applied to artifacts written by the pipeline.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let backend = self.backend.as_ref()?;
        match backend.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Cache get failed for {}: {}", short_key(key), e);
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if let Err(e) = backend.set(key, value, ttl).await {
            warn!("Cache set failed for {}: {}", short_key(key), e);
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };
        match backend.exists(key).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Cache exists failed for {}: {}", short_key(key), e);
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if let Err(e) = backend.delete(key).await {
            warn!("Cache delete failed for {}: {}", short_key(key), e);
        }
    }

    pub async fn get_binary(&self, key: &str) -> Option<Vec<u8>> {
        let encoded = self.get(key).await?;
        match STANDARD.decode(encoded.as_bytes()) {
            Ok(data) => {
                debug!("Cache hit: {} ({} bytes)", short_key(key), data.len());
                Some(data)
            }
            Err(e) => {
                warn!("Cached value for {} is not base64: {}", short_key(key), e);
                None
            }
        }
    }

    pub async fn set_binary(&self, key: &str, data: &[u8], ttl: Duration) {
        self.set(key, &STANDARD.encode(data), ttl).await;
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Cached value for {} is not valid JSON: {}", short_key(key), e);
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw, ttl).await,
            Err(e) => warn!("Failed to serialize cache value for {}: {}", short_key(key), e),
        }
    }

    /// Reachability for health reporting; a disabled cache is unreachable.
    pub async fn ping(&self) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };
        match backend.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache ping failed: {}", e);
                false
            }
        }
    }
}

/// Key prefix for log lines.
pub(crate) fn short_key(key: &str) -> &str {
    key.get(..20).unwrap_or(key)
}
