//! Prompt definition data model
//!
//! A prompt file is an ordered YAML list. Each entry is either a bare
//! instruction string or a structured record with a label and output
//! options. Validation produces a flat, fully-defaulted record; there is
//! no runtime schema machinery.

use serde::Deserialize;

use crate::error::PromptError;

/// How the refined output is materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputStrategy {
    /// Write the result to a side artifact opened read-only
    Overwrite,
    /// Replace the selection in a side artifact and compare against the
    /// source
    Diff,
    /// Insert the result into the live document after the selection
    Append,
    /// Ask the user each time; resolved away before execution
    AskUser,
}

impl Default for OutputStrategy {
    fn default() -> Self {
        Self::Diff
    }
}

/// Output options attached to a prompt entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Materialization strategy, `diff` by default
    pub strategy: OutputStrategy,
    /// Back up the previous artifact before the first write
    pub backup: bool,
}

/// One entry in the prompt definition file
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PromptEntry {
    /// A bare string used directly as instruction text
    Bare(String),
    /// A structured record
    Detailed {
        #[serde(default)]
        label: String,
        description: String,
        #[serde(default)]
        output: OutputOptions,
    },
}

impl PromptEntry {
    /// Display label for pickers: the explicit label, or the instruction
    /// text itself for bare entries
    pub fn label(&self) -> &str {
        match self {
            Self::Bare(text) => text,
            Self::Detailed { label, description, .. } => {
                if label.is_empty() {
                    description
                } else {
                    label
                }
            }
        }
    }

    /// Flatten the entry into a fully-defaulted prompt.
    ///
    /// `choose` supplies the strategy when the entry says `ask-user`;
    /// returning `None` cancels the operation.
    pub fn resolve(
        &self,
        choose: impl FnOnce(&[OutputStrategy]) -> Option<OutputStrategy>,
    ) -> Result<ResolvedPrompt, PromptError> {
        let (label, text, options) = match self {
            Self::Bare(text) => (text.clone(), text.clone(), OutputOptions::default()),
            Self::Detailed {
                label,
                description,
                output,
            } => (label.clone(), description.clone(), *output),
        };

        let strategy = match options.strategy {
            OutputStrategy::AskUser => {
                let choices = [
                    OutputStrategy::Overwrite,
                    OutputStrategy::Diff,
                    OutputStrategy::Append,
                ];
                choose(&choices).ok_or(PromptError::Canceled)?
            }
            fixed => fixed,
        };

        Ok(ResolvedPrompt {
            label,
            text,
            strategy,
            backup: options.backup,
        })
    }
}

/// A flat prompt ready for execution. `strategy` is never
/// [`OutputStrategy::AskUser`] here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrompt {
    /// Display label
    pub label: String,
    /// Instruction text sent as the system prompt
    pub text: String,
    /// Materialization strategy
    pub strategy: OutputStrategy,
    /// Back up the previous artifact before the first write
    pub backup: bool,
}
