//! Prompt definitions for text refinement
//!
//! Loads the user's prompt file (an ordered YAML list of instruction
//! entries), validates it, and flattens each entry into a fully-defaulted
//! prompt record ready for execution.

pub mod error;
pub mod models;
pub mod store;

pub use error::PromptError;
pub use models::{OutputOptions, OutputStrategy, PromptEntry, ResolvedPrompt};
pub use store::{PromptStore, TEMPLATE};
