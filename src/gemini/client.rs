use super::types::*;
use crate::{Error, Result, config::GeminiConfig};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate_content(&self, request: ContentRequest) -> Result<ContentResponse>;
}

pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    image_model: String,
    analysis_model: String,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            image_model: config.image_model,
            analysis_model: config.analysis_model,
        })
    }

    fn model_for(&self, kind: ModelKind) -> &str {
        match kind {
            ModelKind::Image => &self.image_model,
            ModelKind::Analysis => &self.analysis_model,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_content(&self, request: ContentRequest) -> Result<ContentResponse> {
        let model = self.model_for(request.kind);
        debug!(
            "Calling {} with {} parts ({} images)",
            model,
            request.parts.len(),
            request.image_count()
        );

        let body = GenerateContentBody::from_request(&request);
        let response = self
            .http
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::generation(format!(
                "{} returned {}: {}",
                model, status, text
            )));
        }

        let reply: GenerateContentReply = response.json().await?;
        if let Some(message) = reply.error.and_then(|err| err.message) {
            return Err(Error::generation(message));
        }

        let parts: Vec<Part> = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(WirePart::into_part)
                    .collect()
            })
            .unwrap_or_default();

        debug!("{} replied with {} parts", model, parts.len());

        Ok(ContentResponse { parts })
    }
}
