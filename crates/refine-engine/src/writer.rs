//! Output writing strategies
//!
//! A writer receives the full accumulated text on every call and
//! materializes it somewhere: a comparison artifact, a standalone result
//! file, or the live document itself. Rewriting from the whole text each
//! time makes writes idempotent, so a throttled schedule that ends in a
//! final write always converges on the same result.
//!
//! Editor-facing side effects are not performed here; they are emitted as
//! [`HostEvent`]s for the embedding host to act on.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::artifact::ArtifactStore;
use crate::document::{Document, EditEvent};
use crate::error::EngineError;
use crate::tracker::OffsetTracker;

/// Side effect requested from the embedding host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Open a comparison view between two files
    OpenDiff { left: PathBuf, right: PathBuf },
    /// Open a file for preview
    OpenPreview { path: PathBuf },
    /// Single-line progress text
    Status(String),
}

pub type HostEventSender = mpsc::UnboundedSender<HostEvent>;

pub(crate) fn emit(events: &Option<HostEventSender>, event: HostEvent) {
    if let Some(sender) = events {
        // The host hanging up is not the stream's problem.
        let _ = sender.send(event);
    }
}

/// Destination for accumulated stream output.
///
/// `write` always receives the whole accumulated text; `is_final` is set
/// exactly once, on the last write of a run that completes.
#[async_trait]
pub trait ResultWriter: Send {
    async fn write(&mut self, accumulated: &str, is_final: bool) -> Result<(), EngineError>;

    /// Foreign document edit, in host delivery order. Only the live
    /// document strategy cares.
    fn handle_edit(&mut self, _event: &EditEvent) {}
}

/// Writes the source with the selection replaced, for side-by-side
/// comparison against the original
pub struct DiffWriter {
    store: ArtifactStore,
    source_path: PathBuf,
    artifact: PathBuf,
    source_text: String,
    selection: std::ops::Range<usize>,
    backup: bool,
    prepared: bool,
    opened: bool,
    events: Option<HostEventSender>,
}

impl DiffWriter {
    pub fn new(
        store: ArtifactStore,
        source_path: PathBuf,
        source_text: String,
        selection: std::ops::Range<usize>,
        backup: bool,
        events: Option<HostEventSender>,
    ) -> Self {
        let artifact = store.cache_path(&source_path);
        Self {
            store,
            source_path,
            artifact,
            source_text,
            selection,
            backup,
            prepared: false,
            opened: false,
            events,
        }
    }

    /// Path of the artifact this writer maintains
    pub fn artifact(&self) -> &PathBuf {
        &self.artifact
    }
}

#[async_trait]
impl ResultWriter for DiffWriter {
    async fn write(&mut self, accumulated: &str, _is_final: bool) -> Result<(), EngineError> {
        if !self.prepared {
            self.store.prepare(&self.artifact, self.backup).await?;
            self.prepared = true;
        }

        let mut result = self.source_text.clone();
        result.replace_range(self.selection.clone(), accumulated);
        self.store.write(&self.artifact, &result).await?;

        if !self.opened {
            self.opened = true;
            emit(
                &self.events,
                HostEvent::OpenDiff {
                    left: self.source_path.clone(),
                    right: self.artifact.clone(),
                },
            );
        }
        Ok(())
    }
}

/// Writes the accumulated text alone into the artifact
pub struct OverwriteWriter {
    store: ArtifactStore,
    artifact: PathBuf,
    backup: bool,
    prepared: bool,
    opened: bool,
    events: Option<HostEventSender>,
}

impl OverwriteWriter {
    pub fn new(
        store: ArtifactStore,
        source_path: PathBuf,
        backup: bool,
        events: Option<HostEventSender>,
    ) -> Self {
        let artifact = store.cache_path(&source_path);
        Self {
            store,
            artifact,
            backup,
            prepared: false,
            opened: false,
            events,
        }
    }

    pub fn artifact(&self) -> &PathBuf {
        &self.artifact
    }
}

#[async_trait]
impl ResultWriter for OverwriteWriter {
    async fn write(&mut self, accumulated: &str, _is_final: bool) -> Result<(), EngineError> {
        if !self.prepared {
            self.store.prepare(&self.artifact, self.backup).await?;
            self.prepared = true;
        }

        self.store.write(&self.artifact, accumulated).await?;

        if !self.opened {
            self.opened = true;
            emit(
                &self.events,
                HostEvent::OpenPreview {
                    path: self.artifact.clone(),
                },
            );
        }
        Ok(())
    }
}

/// Streams the accumulated text into the live document after the
/// selection, tracking its region through foreign edits.
///
/// Between writes the region is protected from user edits; the final
/// write lifts the protection and detaches the tracker, releasing the
/// region back to the user.
pub struct AppendWriter<D: Document> {
    doc: Arc<Mutex<D>>,
    tracker: OffsetTracker,
}

impl<D: Document> AppendWriter<D> {
    /// Start appending at `insert_at`, typically the selection end
    pub fn new(doc: Arc<Mutex<D>>, insert_at: usize) -> Self {
        Self {
            doc,
            tracker: OffsetTracker::new(insert_at),
        }
    }

    /// Current live region, for tests and host display
    pub fn region(&self) -> Option<std::ops::Range<usize>> {
        self.tracker.range()
    }
}

#[async_trait]
impl<D: Document> ResultWriter for AppendWriter<D> {
    async fn write(&mut self, accumulated: &str, is_final: bool) -> Result<(), EngineError> {
        let Some(range) = self.tracker.range() else {
            debug!("write after detach ignored");
            return Ok(());
        };

        let mut doc = self.doc.lock().await;
        let text = doc.line_ending().apply(accumulated);
        doc.replace(range, &text);
        self.tracker.after_write(text.len());

        if is_final {
            doc.protect(None);
            self.tracker.detach();
        } else {
            doc.protect(self.tracker.range());
        }
        Ok(())
    }

    fn handle_edit(&mut self, event: &EditEvent) {
        self.tracker.on_external_edit(event);
    }
}
