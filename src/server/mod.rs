mod handlers;
mod types;

pub use handlers::AppState;
pub use types::*;

use crate::{
    Result,
    analytics::AnalyticsSink,
    cache::CacheStore,
    config::Config,
    gemini::{GeminiClient, GenerativeModel},
    pipeline::{GenerationOrchestrator, PipelineLimits},
    prompts::PromptCatalog,
    records::{RecordStore, RestRecordStore},
    request::RequestNormalizer,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Wires every service from configuration. Cache and record store are
/// optional; without them the pipeline runs on built-in prompts and no cache.
pub fn build_state(config: &Config) -> Result<AppState> {
    let model: Arc<dyn GenerativeModel> = Arc::new(GeminiClient::new(config.gemini.clone())?);

    let records: Option<Arc<dyn RecordStore>> = match &config.records {
        Some(records) => {
            info!("Record store configured at {}", records.url);
            Some(Arc::new(RestRecordStore::new(records.clone())?))
        }
        None => {
            info!("Record store not configured - using built-in prompts");
            None
        }
    };

    let cache = CacheStore::from_config(&config.cache)?;
    let catalog = Arc::new(PromptCatalog::new(
        records.clone(),
        config.prompts.memo_capacity,
    ));

    let orchestrator = GenerationOrchestrator::new(model, catalog.clone(), cache.clone())
        .with_analytics(AnalyticsSink::new(records.clone()))
        .with_limits(PipelineLimits::from(&config.pipeline));

    Ok(AppState {
        orchestrator: Arc::new(orchestrator),
        normalizer: Arc::new(RequestNormalizer::new(catalog.clone())),
        catalog,
        cache,
        records,
    })
}

pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(handlers::banner))
        .route("/health", get(handlers::health))
        .route(
            "/generate-studio-image",
            post(handlers::generate_studio_image),
        )
        .route(
            "/generate-studio-image-v2",
            post(handlers::generate_studio_image),
        )
        .route(
            "/pregenerate-background",
            post(handlers::pregenerate_background),
        )
        .route("/cache/stats", get(handlers::cache_stats))
        .route("/config/lighting-schemes", get(handlers::lighting_schemes))
        .route("/config/backgrounds", get(handlers::backgrounds))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let state = build_state(&config)?;
    let app = router(state, config.server.body_limit);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
