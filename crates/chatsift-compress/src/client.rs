//! Summarization service boundary: single-attempt backends and the
//! retry-aware summarizer interface the pipeline talks to

use thiserror::Error;

/// Classified failure of one request to the summarization service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// HTTP 429
    RateLimited,
    /// HTTP 529
    Overloaded,
    /// Any other 5xx
    ServerError(u16),
    Timeout,
    /// Request never reached the service
    Connection,
    /// 4xx other than 429: bad request, auth, content policy
    ClientError(u16),
    /// Service answered but the body was unusable
    InvalidResponse,
}

impl FailureKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => FailureKind::RateLimited,
            529 => FailureKind::Overloaded,
            500..=599 => FailureKind::ServerError(status),
            _ => FailureKind::ClientError(status),
        }
    }

    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            FailureKind::RateLimited
                | FailureKind::Overloaded
                | FailureKind::ServerError(_)
                | FailureKind::Timeout
                | FailureKind::Connection
        )
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::RateLimited => write!(f, "rate limited (429)"),
            FailureKind::Overloaded => write!(f, "overloaded (529)"),
            FailureKind::ServerError(code) => write!(f, "server error ({})", code),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Connection => write!(f, "connection failure"),
            FailureKind::ClientError(code) => write!(f, "client error ({})", code),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
        }
    }
}

/// Failure of a single attempt
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Final failure of a summarization call, after any retries
#[derive(Debug, Clone, Error)]
#[error("summarization failed with {kind} after {attempts} attempt(s): {message}")]
pub struct SummarizeError {
    pub kind: FailureKind,
    pub message: String,
    pub attempts: u32,
}

impl SummarizeError {
    pub fn from_api(err: ApiError, attempts: u32) -> Self {
        Self {
            kind: err.kind,
            message: err.message,
            attempts,
        }
    }
}

/// One request to the summarization service
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
}

/// A single attempt against a text-generation service
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn send(&self, request: &CompletionRequest<'_>) -> Result<String, ApiError>;
}

/// Text generation as the pipeline sees it: either usable text or a
/// classified failure, never both
#[allow(async_fn_in_trait)]
pub trait Summarizer {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, SummarizeError>;
}

impl<S: Summarizer> Summarizer for &S {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, SummarizeError> {
        (**self).complete(system, user, max_tokens).await
    }
}
