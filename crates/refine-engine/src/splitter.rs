//! Token-budgeted input splitting
//!
//! Oversized input is cut at structural boundaries into fragments, then
//! consecutive fragments are merged greedily while they fit the budget.
//! Chunks concatenate back to exactly the original text, so processing
//! them in order preserves document order in the final output.

use regex::Regex;
use tracing::debug;

use crate::error::EngineError;

/// Model-specific token counting seam. See
/// `refine_providers::TokenCounter` for the tiktoken-backed
/// implementation.
pub trait TokenEstimator {
    /// Number of tokens `text` occupies
    fn count(&self, text: &str) -> usize;
}

impl TokenEstimator for refine_providers::TokenCounter {
    fn count(&self, text: &str) -> usize {
        refine_providers::TokenCounter::count(self, text)
    }
}

/// Split `text` into chunks of at most `budget` tokens, cutting only at
/// positions matching `boundary`.
///
/// Fails with [`EngineError::ChunkTooLarge`] when a single fragment
/// between boundaries exceeds the budget: it cannot be split further
/// without breaking structure.
pub fn split(
    text: &str,
    budget: usize,
    boundary: &Regex,
    tokens: &dyn TokenEstimator,
) -> Result<Vec<String>, EngineError> {
    let fragments = partition(text, boundary);

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_tokens = 0usize;

    for fragment in fragments {
        let count = tokens.count(&fragment);
        if count > budget {
            return Err(EngineError::ChunkTooLarge {
                tokens: count,
                budget,
            });
        }
        if current_tokens + count > budget && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_tokens = 0;
        }
        current.push_str(&fragment);
        current_tokens += count;
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    debug!("split {} bytes into {} chunk(s)", text.len(), chunks.len());
    Ok(chunks)
}

/// Cut `text` immediately before every boundary match
fn partition(text: &str, boundary: &Regex) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut last = 0;
    for m in boundary.find_iter(text) {
        if m.start() > last {
            fragments.push(text[last..m.start()].to_string());
            last = m.start();
        }
    }
    if last < text.len() {
        fragments.push(text[last..].to_string());
    }
    fragments
}
