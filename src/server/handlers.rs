use super::types::{
    BackgroundResponse, BackgroundsResponse, CacheStatsResponse, ErrorResponse, GenerateResponse,
    HealthResponse, SchemesResponse,
};
use crate::{
    Error,
    cache::CacheStore,
    pipeline::GenerationOrchestrator,
    prompts::PromptCatalog,
    records::RecordStore,
    request::{DEFAULT_IMAGE_MIME, ImageInput, Quality, RawForm, RequestNormalizer},
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub normalizer: Arc<RequestNormalizer>,
    pub catalog: Arc<PromptCatalog>,
    pub cache: CacheStore,
    pub records: Option<Arc<dyn RecordStore>>,
}

impl AppState {
    async fn config_connected(&self) -> bool {
        match &self.records {
            Some(store) => match store.ping().await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Record store ping failed: {}", e);
                    false
                }
            },
            None => false,
        }
    }
}

fn api_error(request_id: Uuid, e: Error) -> ApiError {
    let status = e.status_code();
    if e.is_client_error() {
        warn!("Request {} rejected: {}", request_id, e);
    } else {
        error!("Request {} failed: {}", request_id, e);
    }
    (status, Json(ErrorResponse { error: e.to_string() }))
}

/// Serves both `/generate-studio-image` and its `-v2` alias.
pub async fn generate_studio_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<GenerateResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    info!("Received generation request {}", request_id);

    let form = RawForm::from_multipart(multipart)
        .await
        .map_err(|e| api_error(request_id, e))?;
    let request = state
        .normalizer
        .normalize(&form)
        .await
        .map_err(|e| api_error(request_id, e))?;

    let result = state
        .orchestrator
        .run(&request)
        .await
        .map_err(|e| api_error(request_id, e))?;

    info!(
        "Request {} completed in {:?} after {} attempts",
        request_id, result.elapsed, result.attempts
    );
    Ok(Json(GenerateResponse::from(result)))
}

pub async fn pregenerate_background(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BackgroundResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    info!("Received background pre-generation request {}", request_id);

    let form = RawForm::from_multipart(multipart)
        .await
        .map_err(|e| api_error(request_id, e))?;
    let image = form
        .file("image")
        .map(|file| {
            ImageInput::new(
                file.data.clone(),
                file.content_type.as_deref().unwrap_or(DEFAULT_IMAGE_MIME),
            )
        })
        .ok_or_else(|| {
            api_error(
                request_id,
                Error::invalid_request("No background image provided"),
            )
        })?;
    let quality = Quality::parse_or(form.field("quality"), Quality::TwoK);

    let artifact = state
        .orchestrator
        .pregenerate_background(&image, quality)
        .await
        .map_err(|e| api_error(request_id, e))?;

    Ok(Json(BackgroundResponse::from(artifact)))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        cache: state.cache.ping().await,
        config: state.config_connected().await,
    })
}

pub async fn banner(State(state): State<AppState>) -> String {
    format!(
        "Studio Lights API (cache: {}, config: {})",
        state.cache.ping().await,
        state.config_connected().await
    )
}

pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse {
        cache_connected: state.cache.ping().await,
        config_connected: state.config_connected().await,
    })
}

pub async fn lighting_schemes(State(state): State<AppState>) -> Json<SchemesResponse> {
    Json(SchemesResponse {
        schemes: state.catalog.lighting_schemes().await,
    })
}

pub async fn backgrounds(State(state): State<AppState>) -> Json<BackgroundsResponse> {
    Json(BackgroundsResponse {
        backgrounds: state.catalog.backgrounds().await,
    })
}
