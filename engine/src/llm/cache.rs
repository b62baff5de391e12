//! In-memory response cache.
//!
//! Identical requests (same messages, same bound tools) within one process
//! are answered from memory. Keys are blake3 digests of the serialized
//! request, so the map never holds full prompts.

use async_trait::async_trait;
use sdk::ToolSpec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{LLMError, LLMProvider, LLMResponse, Message, Result};

pub struct CachedProvider {
    inner: Arc<dyn LLMProvider>,
    entries: Mutex<HashMap<String, LLMResponse>>,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn LLMProvider>) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached responses
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cache_key(messages: &[Message], tools: &[ToolSpec]) -> Result<String> {
        let payload = serde_json::to_vec(&(messages, tools))
            .map_err(|e| LLMError::InvalidRequest(format!("unserializable request: {}", e)))?;
        Ok(blake3::hash(&payload).to_hex().to_string())
    }
}

#[async_trait]
impl LLMProvider for CachedProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LLMResponse> {
        let key = Self::cache_key(messages, tools)?;

        if let Ok(entries) = self.entries.lock() {
            if let Some(hit) = entries.get(&key) {
                tracing::debug!("LLM cache hit {}", &key[..12]);
                return Ok(hit.clone());
            }
        }

        let response = self.inner.generate(messages, tools).await?;

        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, response.clone());
        }

        Ok(response)
    }

    async fn check_health(&self) -> bool {
        self.inner.check_health().await
    }
}
