//! Token-budgeted compaction backed by an LLM summarization service

mod anthropic;
mod client;
mod compactor;
mod compress;
mod retry;
mod tokens;

pub use anthropic::{AnthropicBackend, MESSAGES_ENDPOINT};
pub use client::{ApiError, Backend, CompletionRequest, FailureKind, SummarizeError, Summarizer};
pub use compactor::{CompactionLimits, Compactor};
pub use compress::{recent_within_budget, INSIGHT_SEPARATOR};
pub use retry::{RetryPolicy, RetryingClient};
pub use tokens::{heuristic_estimate, TokenEstimator, GENERIC_ENCODING};
