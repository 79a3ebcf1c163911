//! Error types for prompt handling

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or resolving prompts
#[derive(Debug, Error)]
pub enum PromptError {
    /// The prompt file does not exist. The host should offer to create a
    /// default template (see `PromptStore::create_default`).
    #[error("Prompt file not found: {0}")]
    NotFound(PathBuf),

    /// The prompt file is not a valid YAML list of entries
    #[error("Failed to parse prompt file: {0}")]
    Parse(String),

    /// The requested entry index does not exist
    #[error("No prompt entry at index {0}")]
    OutOfRange(usize),

    /// The user declined a selection. Silent: never surfaced as an error.
    #[error("Canceled")]
    Canceled,

    /// Filesystem error while reading or writing the prompt file
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
