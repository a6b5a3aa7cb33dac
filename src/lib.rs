pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod gemini;
pub mod pipeline;
pub mod prompts;
pub mod records;
pub mod request;
pub mod server;
pub mod verify;

pub use error::{Error, Result};
