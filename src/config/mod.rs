mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use std::path::Path;
use tracing::{debug, info};

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let config = load_from(&config_path).await?;
    let config = apply_overrides(config, |key| env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

/// Reads the YAML file at `path`. A missing file yields the defaults so the
/// service can run from environment variables alone.
pub async fn load_from(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    debug!("Loading configuration from: {}", path.display());

    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        info!(
            "Configuration file {} not found, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let config_str = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&config_str)?;

    Ok(config)
}

/// Environment values win over file values. Supplying the cache URL and token
/// selects the Upstash backend.
pub fn apply_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(key) = lookup("GOOGLE_API_KEY") {
        config.gemini.api_key = key;
    }

    if let Some(port) = lookup("PORT").and_then(|value| value.parse::<u16>().ok()) {
        config.server.port = port;
    }

    if let (Some(url), Some(token)) = (
        lookup("UPSTASH_REDIS_REST_URL"),
        lookup("UPSTASH_REDIS_REST_TOKEN"),
    ) {
        config.cache.backend = CacheBackendKind::Upstash;
        config.cache.url = Some(url);
        config.cache.token = Some(token);
    }

    if let (Some(url), Some(api_key)) = (lookup("SUPABASE_URL"), lookup("SUPABASE_ANON_KEY")) {
        let timeout_ms = config
            .records
            .as_ref()
            .map(|records| records.timeout_ms)
            .unwrap_or(5_000);
        config.records = Some(RecordsConfig {
            url,
            api_key,
            timeout_ms,
        });
    }

    config
}

pub fn validate(config: &Config) -> Result<()> {
    if config.gemini.api_key.trim().is_empty() {
        return Err(Error::config(
            "gemini.api_key is empty; set it in the config file or GOOGLE_API_KEY",
        ));
    }

    if config.cache.backend == CacheBackendKind::Upstash
        && (config.cache.url.is_none() || config.cache.token.is_none())
    {
        return Err(Error::config("cache backend 'upstash' needs both url and token"));
    }

    if config.cache.ttl_secs == 0 {
        return Err(Error::config("cache.ttl_secs must be at least 1"));
    }

    if config.pipeline.max_generation_attempts == 0 {
        return Err(Error::config("pipeline.max_generation_attempts must be at least 1"));
    }

    Ok(())
}
