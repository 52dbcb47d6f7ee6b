//! Bounded exponential backoff around a [`Backend`]

use crate::client::{Backend, CompletionRequest, SummarizeError, Summarizer};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Multiplicative jitter half-width; 0.2 means a factor in [0.8, 1.2]
    pub jitter: f64,
}

impl RetryPolicy {
    /// Delay after the `attempt`-th failure (1-based)
    ///
    /// `unit` is a uniform sample from [0, 1] that picks the jitter factor.
    pub fn delay_for_attempt(&self, attempt: u32, unit: f64) -> Duration {
        let exponent = attempt.saturating_sub(1).min(30) as i32;
        let base = self.base_delay.as_secs_f64() * 2f64.powi(exponent);
        let capped = base.min(self.max_delay.as_secs_f64());
        let factor = 1.0 + (unit.clamp(0.0, 1.0) * 2.0 - 1.0) * self.jitter;
        Duration::try_from_secs_f64((capped * factor).max(0.0)).unwrap_or(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(120),
            jitter: 0.2,
        }
    }
}

/// Summarizer that retries transient backend failures
pub struct RetryingClient<B> {
    backend: B,
    policy: RetryPolicy,
    jitter_source: fn() -> f64,
}

impl<B: Backend> RetryingClient<B> {
    pub fn new(backend: B, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            jitter_source: rand::random::<f64>,
        }
    }

    /// Replace the uniform [0, 1] sampler used for jitter
    pub fn with_jitter_source(mut self, source: fn() -> f64) -> Self {
        self.jitter_source = source;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: Backend> Summarizer for RetryingClient<B> {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, SummarizeError> {
        let request = CompletionRequest {
            system,
            user,
            max_tokens,
        };
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let err = match self.backend.send(&request).await {
                Ok(text) => return Ok(text),
                Err(err) => err,
            };

            if !err.kind.is_retriable() {
                tracing::error!("Non-retriable API error: {}", err);
                return Err(SummarizeError::from_api(err, attempt));
            }
            if attempt >= max_attempts {
                tracing::error!("API error: {}. Max retries reached.", err);
                return Err(SummarizeError::from_api(err, attempt));
            }

            let delay = self
                .policy
                .delay_for_attempt(attempt, (self.jitter_source)());
            tracing::warn!(
                "API error: {}. Retrying in {:.2}s (attempt {}/{})...",
                err,
                delay.as_secs_f64(),
                attempt + 1,
                max_attempts
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
