use crate::{Error, Result, config::RecordsConfig};
use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Remote table store holding prompt templates, lighting schemes,
/// backgrounds and the generation log.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows of `table` whose columns equal every `(column, value)` filter.
    async fn select(
        &self,
        table: &str,
        columns: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<Value>>;

    async fn insert(&self, table: &str, row: Value) -> Result<()>;

    async fn ping(&self) -> Result<()>;
}

/// PostgREST-style client (`/rest/v1/{table}` with `eq.` filters).
pub struct RestRecordStore {
    http: Client,
    base_url: String,
}

impl RestRecordStore {
    pub fn new(config: RecordsConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "apikey",
            header::HeaderValue::from_str(&config.api_key)
                .map_err(|e| Error::config(format!("Invalid record store key: {}", e)))?,
        );
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| Error::config(format!("Invalid record store key: {}", e)))?,
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn select(
        &self,
        table: &str,
        columns: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<Value>> {
        let mut query: Vec<(String, String)> = vec![("select".to_string(), columns.to_string())];
        for (column, value) in filters {
            query.push((column.to_string(), format!("eq.{}", value)));
        }

        debug!("Selecting {} from {} ({} filters)", columns, table, filters.len());

        let response = self
            .http
            .get(self.table_url(table))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::records(format!(
                "select from {} returned {}",
                table, status
            )));
        }

        Ok(response.json().await?)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<()> {
        let response = self
            .http
            .post(self.table_url(table))
            .json(&row)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::records(format!(
                "insert into {} returned {}",
                table, status
            )));
        }

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let response = self
            .http
            .get(format!("{}/rest/v1/", self.base_url))
            .send()
            .await?;

        if response.status().is_server_error() {
            return Err(Error::records(format!(
                "record store unhealthy: {}",
                response.status()
            )));
        }

        Ok(())
    }
}
