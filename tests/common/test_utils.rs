use super::mocks::{MockGenerativeModel, MockRecordStore};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use studio_lights::{
    Result,
    analytics::AnalyticsSink,
    cache::{CacheStore, MemoryBackend},
    config::{CacheBackendKind, Config},
    gemini::GenerativeModel,
    pipeline::{GenerationOrchestrator, PipelineLimits},
    prompts::PromptCatalog,
    records::RecordStore,
    request::{GenerationRequest, ImageInput, RequestNormalizer},
    server::{self, AppState},
};
use tempfile::TempDir;
use tokio::fs;

pub const PRODUCT_JPEG: &[u8] = b"\xff\xd8\xffproduct-photo";
pub const BACKGROUND_JPEG: &[u8] = b"\xff\xd8\xffkraft-paper-with-logo";

/// Create a test configuration with sensible defaults
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 8080;
    config.server.logs.level = "debug".to_string();
    config.gemini.api_key = "test-api-key".to_string();
    config.cache.backend = CacheBackendKind::Memory;
    config
}

pub fn product_image() -> ImageInput {
    ImageInput::new(PRODUCT_JPEG.to_vec(), "image/jpeg")
}

pub fn background_image() -> ImageInput {
    ImageInput::new(BACKGROUND_JPEG.to_vec(), "image/jpeg")
}

/// Product-only request with the builtin softbox lighting.
pub fn create_test_request() -> GenerationRequest {
    GenerationRequest::new(product_image())
}

/// Request that triggers background reproduction.
pub fn create_branded_request() -> GenerationRequest {
    let mut request = create_test_request();
    request.background = Some(background_image());
    request.has_branding = true;
    request
}

pub fn memory_cache() -> CacheStore {
    CacheStore::new(
        Arc::new(MemoryBackend::new(32)),
        Duration::from_secs(7 * 24 * 60 * 60),
    )
}

pub fn create_catalog(store: Option<Arc<MockRecordStore>>) -> Arc<PromptCatalog> {
    let store = store.map(|store| store as Arc<dyn RecordStore>);
    Arc::new(PromptCatalog::new(store, 16))
}

pub fn create_orchestrator(
    model: Arc<MockGenerativeModel>,
    cache: CacheStore,
) -> GenerationOrchestrator {
    GenerationOrchestrator::new(model as Arc<dyn GenerativeModel>, create_catalog(None), cache)
        .with_limits(PipelineLimits {
            max_generation_attempts: 3,
            max_verification_retries: 2,
        })
}

/// Router over mocks; `records` backs the catalog, analytics and health checks.
pub fn create_test_app(
    model: Arc<MockGenerativeModel>,
    records: Option<Arc<MockRecordStore>>,
) -> Router {
    let records = records.map(|store| store as Arc<dyn RecordStore>);
    let catalog = Arc::new(PromptCatalog::new(records.clone(), 16));
    let cache = memory_cache();

    let orchestrator = GenerationOrchestrator::new(
        model as Arc<dyn GenerativeModel>,
        catalog.clone(),
        cache.clone(),
    )
    .with_analytics(AnalyticsSink::new(records.clone()));

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        normalizer: Arc::new(RequestNormalizer::new(catalog.clone())),
        catalog,
        cache,
        records,
    };
    server::router(state, 10 * 1024 * 1024)
}

/// Hand-built `multipart/form-data` body for router tests.
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: format!("studio-test-{}", uuid::Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, mime_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}.jpg\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, name, mime_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Returns the content type header value and the encoded body.
    pub fn build(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a temporary directory for test files
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Create a test config YAML file
pub async fn create_test_config_file(dir: &TempDir, content: &str) -> Result<String> {
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, content).await?;
    Ok(config_path.to_string_lossy().to_string())
}

/// Sample configuration covering every section
pub const SAMPLE_CONFIG_YAML: &str = r#"
server:
  host: "0.0.0.0"
  port: 9000
  logs:
    level: "debug"

gemini:
  api_key: "file-key"
  image_model: "gemini-3-pro-image-preview"

cache:
  backend: memory
  ttl_secs: 60
  memory_capacity: 8

records:
  url: "https://records.example.com"
  api_key: "anon-key"

pipeline:
  max_generation_attempts: 2
  max_verification_retries: 1
"#;
