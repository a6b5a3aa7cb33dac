use super::builtin;
use crate::records::RecordStore;
use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Which tier of the resolution chain served a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSource {
    Remote,
    Fallback,
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrompt {
    pub text: String,
    pub source: PromptSource,
}

impl ResolvedPrompt {
    fn remote(text: String) -> Self {
        Self {
            text,
            source: PromptSource::Remote,
        }
    }

    fn fallback(text: &str) -> Self {
        Self {
            text: text.to_string(),
            source: PromptSource::Fallback,
        }
    }

    fn missing() -> Self {
        Self {
            text: String::new(),
            source: PromptSource::Missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MemoKey {
    Prompt(String),
    Lighting(String),
}

/// Named prompt text resolved as remote record → builtin → empty, memoized
/// per name for the life of the catalog. The memo is bounded and evicts the
/// least recently used name; entries never refresh otherwise.
pub struct PromptCatalog {
    store: Option<Arc<dyn RecordStore>>,
    memo: Mutex<LruCache<MemoKey, ResolvedPrompt>>,
}

impl PromptCatalog {
    pub fn new(store: Option<Arc<dyn RecordStore>>, memo_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(memo_capacity).unwrap_or(NonZeroUsize::MIN);
        if store.is_none() {
            info!("Record store not configured - using builtin prompts");
        }
        Self {
            store,
            memo: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub async fn get(&self, name: &str) -> String {
        self.resolve(name).await.text
    }

    pub async fn resolve(&self, name: &str) -> ResolvedPrompt {
        let key = MemoKey::Prompt(name.to_string());
        if let Some(hit) = self.memo_get(&key) {
            return hit;
        }

        let resolved = match self.remote_prompt(name).await {
            Some(text) => ResolvedPrompt::remote(text),
            None => match builtin::prompt(name) {
                Some(text) => ResolvedPrompt::fallback(text),
                None => ResolvedPrompt::missing(),
            },
        };
        debug!("Prompt '{}' resolved from {:?}", name, resolved.source);

        self.memo_put(key, resolved.clone());
        resolved
    }

    /// Lighting text for a scheme id. Remote rows flagged inactive are
    /// skipped; unknown ids fall back to the builtin softbox scheme.
    pub async fn lighting_scheme(&self, scheme_id: &str) -> ResolvedPrompt {
        let key = MemoKey::Lighting(scheme_id.to_string());
        if let Some(hit) = self.memo_get(&key) {
            return hit;
        }

        let resolved = match self.remote_lighting(scheme_id).await {
            Some(text) => ResolvedPrompt::remote(text),
            None => ResolvedPrompt::fallback(builtin::lighting(scheme_id)),
        };
        info!("Lighting scheme '{}' resolved from {:?}", scheme_id, resolved.source);

        self.memo_put(key, resolved.clone());
        resolved
    }

    pub async fn lighting_schemes(&self) -> Vec<Value> {
        if let Some(store) = &self.store {
            match store
                .select(
                    "lighting_schemes",
                    "id,name,description,prompt_text",
                    &[("is_active", "true")],
                )
                .await
            {
                Ok(rows) => return rows,
                Err(e) => warn!("Failed to list lighting schemes: {}", e),
            }
        }
        builtin::lighting_schemes()
    }

    pub async fn backgrounds(&self) -> Vec<Value> {
        if let Some(store) = &self.store {
            match store
                .select("backgrounds", "id,name,description,is_default", &[])
                .await
            {
                Ok(rows) => return rows,
                Err(e) => warn!("Failed to list backgrounds: {}", e),
            }
        }
        builtin::backgrounds()
    }

    async fn remote_prompt(&self, name: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        let rows = match store
            .select("prompts", "content", &[("name", name), ("is_active", "true")])
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Prompt lookup for '{}' failed: {}", name, e);
                return None;
            }
        };

        rows.first()
            .and_then(|row| row.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    async fn remote_lighting(&self, scheme_id: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        let rows = match store
            .select(
                "lighting_schemes",
                "id,prompt_text,is_active",
                &[("id", scheme_id)],
            )
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Lighting lookup for '{}' failed: {}", scheme_id, e);
                return None;
            }
        };

        let row = rows.first()?;
        let active = row.get("is_active").and_then(Value::as_bool).unwrap_or(true);
        if !active {
            debug!("Lighting scheme '{}' is inactive", scheme_id);
            return None;
        }

        row.get("prompt_text")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn memo_get(&self, key: &MemoKey) -> Option<ResolvedPrompt> {
        match self.memo.lock() {
            Ok(mut memo) => memo.get(key).cloned(),
            Err(e) => {
                warn!("Prompt memo poisoned: {}", e);
                None
            }
        }
    }

    fn memo_put(&self, key: MemoKey, value: ResolvedPrompt) {
        match self.memo.lock() {
            Ok(mut memo) => {
                memo.put(key, value);
            }
            Err(e) => warn!("Prompt memo poisoned: {}", e),
        }
    }
}
