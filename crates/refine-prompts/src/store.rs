//! Prompt file loading and the default template

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::{error::PromptError, models::PromptEntry};

/// Template written by [`PromptStore::create_default`] when no prompt file
/// exists yet
pub const TEMPLATE: &str = r#"- label: chat
  description: |
    Answer the question as technically and precisely as you can. When the
    text reads like notes rather than a question, continue it with the
    information that would come next. Keep the answer under ~500 words.
  output:
    strategy: append
- label: proofread
  description: |
    Review the draft below and return a corrected version. Text wrapped in
    << and >> is an instruction to you, and XXX marks a blank you should
    fill in. Rough notes may be rewritten into full prose, including
    format changes such as turning bullet lists into paragraphs or adding
    headings.
- label: mail
  description: |
    The user is drafting a mail or chat message. Return a revised draft:
    complete missing openings or gaps, and polish the style of text that
    is already nearly finished.
"#;

/// Conventional prompt file location under a workspace root
const DEFAULT_RELATIVE_PATH: &str = ".config/text-refine/prompts.yaml";

/// Loads and parses one prompt definition file
#[derive(Debug, Clone)]
pub struct PromptStore {
    path: PathBuf,
}

impl PromptStore {
    /// Create a store for an explicit prompt file path
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Resolve the prompt file location: an explicitly configured path
    /// wins, otherwise the conventional location under `root`
    pub fn resolve(configured: Option<&Path>, root: &Path) -> Self {
        match configured {
            Some(path) => Self::new(path.to_path_buf()),
            None => Self::new(root.join(DEFAULT_RELATIVE_PATH)),
        }
    }

    /// Path of the prompt file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and parse all entries, in file order
    pub async fn load(&self) -> Result<Vec<PromptEntry>, PromptError> {
        let text = fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PromptError::NotFound(self.path.clone())
            } else {
                PromptError::Io(e)
            }
        })?;
        Self::parse(&text)
    }

    /// Load one entry by its position in the file
    pub async fn select(&self, index: usize) -> Result<PromptEntry, PromptError> {
        let mut entries = self.load().await?;
        if index >= entries.len() {
            return Err(PromptError::OutOfRange(index));
        }
        Ok(entries.swap_remove(index))
    }

    /// Parse prompt file text into entries
    pub fn parse(text: &str) -> Result<Vec<PromptEntry>, PromptError> {
        let entries: Vec<PromptEntry> =
            serde_yaml::from_str(text).map_err(|e| PromptError::Parse(e.to_string()))?;
        if entries.is_empty() {
            return Err(PromptError::Parse(
                "prompt file contains no entries".to_string(),
            ));
        }
        Ok(entries)
    }

    /// Recovery action for [`PromptError::NotFound`]: write the default
    /// template at the store's path
    pub async fn create_default(&self) -> Result<(), PromptError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, TEMPLATE).await?;
        debug!("created default prompt file at {}", self.path.display());
        Ok(())
    }
}
