mod client;
mod types;

pub use client::{GeminiClient, GenerativeModel};
pub use types::{
    ContentRequest, ContentResponse, InlineImage, ModelKind, Part, ResponseFormat,
};
