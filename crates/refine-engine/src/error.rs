//! Error types for the reconciliation engine

use refine_prompts::PromptError;
use refine_providers::ProviderError;
use thiserror::Error;

/// Errors that can unwind a streaming operation
///
/// Partial writes already materialized when an error unwinds the
/// operation are left in place: they are a valid prefix of the eventual
/// answer, not corrupt state.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A structural fragment cannot fit the token budget; it cannot be
    /// split further without breaking structure
    #[error("Chunk too large: {tokens} tokens exceed the {budget} token budget")]
    ChunkTooLarge { tokens: usize, budget: usize },

    /// The invocation carried an empty selection
    #[error("No text selected")]
    EmptySelection,

    /// The selection does not lie within the source text
    #[error("Selection {start}..{end} is out of bounds for a source of {len} bytes")]
    SelectionOutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },

    /// The operation was canceled. Silent: the abort succeeded, nothing is
    /// surfaced to the user.
    #[error("Canceled")]
    Canceled,

    /// Remote model failure
    #[error(transparent)]
    Provider(ProviderError),

    /// Prompt file failure
    #[error(transparent)]
    Prompt(PromptError),

    /// Filesystem failure while writing artifacts
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether this error should produce a user notification.
    ///
    /// Every surfaced error produces exactly one notification; canceled
    /// operations produce none.
    pub fn should_notify(&self) -> bool {
        !matches!(self, Self::Canceled)
    }
}

impl From<ProviderError> for EngineError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Canceled => Self::Canceled,
            other => Self::Provider(other),
        }
    }
}

impl From<PromptError> for EngineError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::Canceled => Self::Canceled,
            other => Self::Prompt(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_silent() {
        assert!(!EngineError::Canceled.should_notify());
        assert!(!EngineError::from(ProviderError::Canceled).should_notify());
        assert!(!EngineError::from(PromptError::Canceled).should_notify());
    }

    #[test]
    fn real_failures_notify_once() {
        assert!(EngineError::ChunkTooLarge {
            tokens: 4000,
            budget: 1000
        }
        .should_notify());
        assert!(
            EngineError::from(ProviderError::RetryExhausted { attempts: 5 }).should_notify()
        );
    }
}
