//! Token counting backed by tiktoken
//!
//! Counts are exact for OpenAI-family tokenizers and a close proxy for
//! other providers. Results are cached since the splitter re-counts the
//! same fragments across merge passes.

use std::{collections::HashMap, sync::Mutex};

use tiktoken_rs::{cl100k_base, CoreBPE};

use crate::error::ProviderError;

/// Token counter with a per-content result cache
pub struct TokenCounter {
    bpe: CoreBPE,
    cache: Mutex<HashMap<String, usize>>,
}

impl TokenCounter {
    /// Create a new token counter
    pub fn new() -> Result<Self, ProviderError> {
        let bpe = cl100k_base().map_err(|e| ProviderError::Internal(e.to_string()))?;
        Ok(Self {
            bpe,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Count tokens for content
    pub fn count(&self, content: &str) -> usize {
        if content.is_empty() {
            return 0;
        }
        if let Ok(cache) = self.cache.lock() {
            if let Some(&count) = cache.get(content) {
                return count;
            }
        }

        let count = self.bpe.encode_with_special_tokens(content).len();

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(content.to_string(), count);
        }
        count
    }

    /// Clear the token count cache
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Get cache size
    pub fn cache_size(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}
