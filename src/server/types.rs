use crate::pipeline::{BackgroundArtifact, GenerationResult};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub message: String,
    /// Base64 of the rendered image.
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

impl From<GenerationResult> for GenerateResponse {
    fn from(result: GenerationResult) -> Self {
        let message = result.message().to_string();
        Self {
            message,
            image: STANDARD.encode(&result.image),
            warnings: (!result.issues.is_empty()).then_some(result.issues),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BackgroundResponse {
    pub message: String,
    pub background_id: String,
    pub image: String,
    pub cached: bool,
}

impl From<BackgroundArtifact> for BackgroundResponse {
    fn from(artifact: BackgroundArtifact) -> Self {
        let message = if artifact.cached {
            "Background retrieved from cache"
        } else {
            "Background generated"
        };
        Self {
            message: message.to_string(),
            background_id: artifact.background_id,
            image: STANDARD.encode(&artifact.image),
            cached: artifact.cached,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub cache: bool,
    pub config: bool,
}

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub cache_connected: bool,
    pub config_connected: bool,
}

#[derive(Debug, Serialize)]
pub struct SchemesResponse {
    pub schemes: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct BackgroundsResponse {
    pub backgrounds: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
