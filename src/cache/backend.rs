use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// Raw string key-value operations. Errors are returned as-is; the
/// [`CacheStore`](super::CacheStore) layer decides how to degrade.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn exists(&self, key: &str) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}

/// Redis over the Upstash REST protocol: each command is POSTed as a JSON
/// array and answered with `{"result": ...}`.
pub struct UpstashBackend {
    http: Client,
    url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

impl UpstashBackend {
    pub fn new(url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            token: token.into(),
        })
    }

    async fn command(&self, command: Value) -> Result<Value> {
        debug!("Cache command {}", command[0]);

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&command)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::cache(format!("cache returned {}", status)));
        }

        let reply: CommandReply = response.json().await?;
        if let Some(error) = reply.error {
            return Err(Error::cache(error));
        }

        Ok(reply.result)
    }
}

#[async_trait]
impl CacheBackend for UpstashBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.command(json!(["GET", key])).await? {
            Value::Null => Ok(None),
            Value::String(value) => Ok(Some(value)),
            other => Ok(Some(other.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.command(json!(["SET", key, value, "EX", ttl.as_secs()]))
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.command(json!(["DEL", key])).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let result = self.command(json!(["EXISTS", key])).await?;
        Ok(result.as_i64() == Some(1))
    }

    async fn ping(&self) -> Result<()> {
        self.command(json!(["PING"])).await?;
        Ok(())
    }
}
