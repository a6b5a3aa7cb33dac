use crate::records::RecordStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const GENERATION_LOG_TABLE: &str = "generation_logs";

/// One row in the generation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationLog {
    pub orientation: String,
    pub lighting_scheme: String,
    /// `image` when a background image reached Stage 2, else `text`.
    pub background_type: String,
    pub quality: String,
    pub has_master: bool,
    pub has_cached_bg: bool,
    pub verification_passed: bool,
    pub verification_attempts: u32,
    pub generation_time_ms: u64,
}

/// Best-effort outcome logging. Inserts run on their own task and failures
/// are only logged.
#[derive(Clone, Default)]
pub struct AnalyticsSink {
    store: Option<Arc<dyn RecordStore>>,
}

impl AnalyticsSink {
    pub fn new(store: Option<Arc<dyn RecordStore>>) -> Self {
        Self { store }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Returns the insert task so callers that care (tests) can await it.
    pub fn record(&self, log: GenerationLog) -> Option<JoinHandle<()>> {
        let store = self.store.clone()?;
        Some(tokio::spawn(async move {
            let row = match serde_json::to_value(&log) {
                Ok(row) => row,
                Err(e) => {
                    warn!("Failed to serialize generation log: {}", e);
                    return;
                }
            };
            match store.insert(GENERATION_LOG_TABLE, row).await {
                Ok(()) => debug!("Generation logged"),
                Err(e) => warn!("Failed to log generation: {}", e),
            }
        }))
    }
}
