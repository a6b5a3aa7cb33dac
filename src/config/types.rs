use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub records: Option<RecordsConfig>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
    /// Upper bound for multipart uploads, in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_analysis_model")]
    pub analysis_model: String,
    #[serde(default = "default_model_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackendKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_service_timeout_ms")]
    pub timeout_ms: u64,
    /// Entry bound for the in-process backend.
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackendKind {
    Upstash,
    Memory,
    #[default]
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_service_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_max_generation_attempts")]
    pub max_generation_attempts: u32,
    #[serde(default = "default_max_verification_retries")]
    pub max_verification_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    #[serde(default = "default_memo_capacity")]
    pub memo_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
            body_limit: default_body_limit(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            api_key: String::new(),
            image_model: default_image_model(),
            analysis_model: default_analysis_model(),
            timeout_secs: default_model_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            url: None,
            token: None,
            ttl_secs: default_cache_ttl_secs(),
            timeout_ms: default_service_timeout_ms(),
            memory_capacity: default_memory_capacity(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_generation_attempts: default_max_generation_attempts(),
            max_verification_retries: default_max_verification_retries(),
        }
    }
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            memo_capacity: default_memo_capacity(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10000
}

fn default_body_limit() -> usize {
    50 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_image_model() -> String {
    "gemini-3-pro-image-preview".to_string()
}

fn default_analysis_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_model_timeout_secs() -> u64 {
    300
}

fn default_cache_ttl_secs() -> u64 {
    86400 * 7
}

fn default_service_timeout_ms() -> u64 {
    5_000
}

fn default_memory_capacity() -> usize {
    256
}

fn default_max_generation_attempts() -> u32 {
    3
}

fn default_max_verification_retries() -> u32 {
    2
}

fn default_memo_capacity() -> usize {
    64
}
