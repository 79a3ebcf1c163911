//! Remote model invocation for text refinement
//!
//! A thin provider abstraction (OpenAI, Anthropic) with streaming via SSE,
//! transparent rate-limit retry, cooperative cancellation, and tokenizer
//! access for budget-aware input splitting.

pub mod error;
pub mod models;
pub mod provider;
pub mod providers;
pub mod retry;
pub mod token_counter;

pub use error::ProviderError;
pub use models::{ChatRequest, ModelRef};
pub use provider::{provider_for, DeltaStream, Provider};
pub use providers::{AnthropicProvider, OpenAiProvider};
pub use retry::{RetryPolicy, RetryingStreamClient};
pub use token_counter::TokenCounter;
