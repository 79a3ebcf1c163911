//! Incremental reconciliation of streamed model output with live text
//!
//! The engine takes a selection of a document, streams a model's
//! rewriting of it, and reconciles the arriving fragments with text that
//! may be edited concurrently. Oversized input is split to a token
//! budget, output lands through a pluggable writing strategy, and writes
//! are throttled so the stream never floods the host.
//!
//! The editor owning the document and its UI is an external
//! collaborator: it feeds [`document::EditEvent`]s in and acts on
//! [`writer::HostEvent`]s coming out.

pub mod artifact;
pub mod config;
pub mod controller;
pub mod diff;
pub mod document;
pub mod error;
pub mod session;
pub mod splitter;
pub mod tracker;
pub mod writer;

pub use artifact::{ArtifactStore, CACHE_DIR};
pub use config::{RefineConfig, DEFAULT_MAX_TOKENS_PER_CHUNK, DEFAULT_THROTTLE};
pub use controller::{SessionState, StreamController, STATUS_TAIL};
pub use diff::{semantic_diff, ChangeKind, DiffOp, DiffResult};
pub use document::{Document, EditEvent, LineEnding, TextBuffer};
pub use error::EngineError;
pub use session::{Accumulator, OutputMode, StreamSession};
pub use splitter::{split, TokenEstimator};
pub use tracker::{LiveAnchor, OffsetTracker};
pub use writer::{
    AppendWriter, DiffWriter, HostEvent, HostEventSender, OverwriteWriter, ResultWriter,
};
