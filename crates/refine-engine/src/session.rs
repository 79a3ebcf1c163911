//! Streaming session state
//!
//! A session captures everything about one refinement run that must not
//! change underneath the stream: the source snapshot, the selection, the
//! resolved prompt and the target model. The accumulator is the only
//! mutable streaming state and lives beside it.

use std::ops::Range;

use refine_prompts::{OutputStrategy, ResolvedPrompt};
use refine_providers::ModelRef;
use tracing::debug;

use crate::error::EngineError;

/// Where the refined text ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Side-by-side comparison against the source
    #[default]
    Diff,
    /// Standalone artifact holding only the result
    Overwrite,
    /// Streamed into the live document after the selection
    Append,
}

impl From<OutputStrategy> for OutputMode {
    fn from(strategy: OutputStrategy) -> Self {
        match strategy {
            OutputStrategy::Diff => Self::Diff,
            OutputStrategy::Overwrite => Self::Overwrite,
            OutputStrategy::Append => Self::Append,
            // Resolution happens before a session is built; an unresolved
            // strategy here falls back to the default.
            OutputStrategy::AskUser => {
                debug!("unresolved ask-user strategy, defaulting to diff");
                Self::Diff
            }
        }
    }
}

/// Immutable description of one refinement run
#[derive(Debug, Clone)]
pub struct StreamSession {
    source_text: String,
    selection: Range<usize>,
    prompt: ResolvedPrompt,
    model: ModelRef,
}

impl StreamSession {
    /// Validate the selection against the source and build a session
    pub fn new(
        source_text: impl Into<String>,
        selection: Range<usize>,
        prompt: ResolvedPrompt,
        model: ModelRef,
    ) -> Result<Self, EngineError> {
        let source_text = source_text.into();
        if selection.start >= selection.end {
            return Err(EngineError::EmptySelection);
        }
        let in_bounds = selection.end <= source_text.len()
            && source_text.is_char_boundary(selection.start)
            && source_text.is_char_boundary(selection.end);
        if !in_bounds {
            return Err(EngineError::SelectionOutOfBounds {
                start: selection.start,
                end: selection.end,
                len: source_text.len(),
            });
        }
        Ok(Self {
            source_text,
            selection,
            prompt,
            model,
        })
    }

    /// Full source snapshot taken at session start
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Selected byte range within the source
    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    /// The selected text, the model's input
    pub fn selected_text(&self) -> &str {
        &self.source_text[self.selection.clone()]
    }

    /// Prompt driving this run
    pub fn prompt(&self) -> &ResolvedPrompt {
        &self.prompt
    }

    /// Model handling this run
    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    /// Output mode derived from the prompt's resolved strategy
    pub fn mode(&self) -> OutputMode {
        OutputMode::from(self.prompt.strategy)
    }

    /// Whether a previous artifact is backed up before the first write
    pub fn backup(&self) -> bool {
        self.prompt.backup
    }
}

/// Accumulated stream output.
///
/// The whole-run text grows monotonically across chunk boundaries; the
/// per-chunk delta list is reset when the next chunk's stream opens.
#[derive(Debug, Default)]
pub struct Accumulator {
    deltas: Vec<String>,
    whole: String,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one stream fragment
    pub fn push(&mut self, delta: &str) {
        self.deltas.push(delta.to_string());
        self.whole.push_str(delta);
    }

    /// Reset per-chunk state for the next chunk's stream
    pub fn start_chunk(&mut self) {
        self.deltas.clear();
    }

    /// Fragments received since the current chunk opened
    pub fn chunk_deltas(&self) -> &[String] {
        &self.deltas
    }

    /// Everything received so far, across all chunks
    pub fn whole(&self) -> &str {
        &self.whole
    }

    pub fn is_empty(&self) -> bool {
        self.whole.is_empty()
    }

    /// Last `n` characters of the whole output with newlines flattened to
    /// spaces, for single-line progress display
    pub fn tail(&self, n: usize) -> String {
        let chars: Vec<char> = self.whole.chars().collect();
        let start = chars.len().saturating_sub(n);
        chars[start..]
            .iter()
            .map(|&c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect()
    }
}
