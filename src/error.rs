use axum::http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Record store error: {0}")]
    Records(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No product image provided")]
    MissingProductImage,

    #[error("Failed after {attempts} attempts: {last_error}")]
    GenerationExhausted { attempts: u32, last_error: String },

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    pub fn records(msg: impl Into<String>) -> Self {
        Self::Records(msg.into())
    }

    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Client input problems are reported as 400 and never retried; everything
    /// else that reaches a handler is a server-side failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingProductImage | Self::InvalidRequest(_) | Self::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_product_image_is_bad_request() {
        let err = Error::MissingProductImage;
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "No product image provided");
    }

    #[test]
    fn test_generation_exhausted_message() {
        let err = Error::GenerationExhausted {
            attempts: 3,
            last_error: "No image in response".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "Failed after 3 attempts: No image in response"
        );
    }
}
