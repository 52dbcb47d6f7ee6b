//! Compaction of a growing insight collection into a bounded running summary

use crate::client::Summarizer;
use crate::compress::{recent_within_budget, INSIGHT_SEPARATOR};
use crate::tokens::TokenEstimator;

/// Size limits for the compaction call itself
#[derive(Debug, Clone)]
pub struct CompactionLimits {
    /// Hard ceiling on the whole compaction request, in tokens
    pub input_ceiling: usize,
    /// Tokens held back from the ceiling for framing and the reply
    pub reserve: usize,
    pub max_output_tokens: u32,
}

impl Default for CompactionLimits {
    fn default() -> Self {
        Self {
            input_ceiling: 150_000,
            reserve: 2_000,
            max_output_tokens: 3_000,
        }
    }
}

pub struct Compactor<'a, S> {
    summarizer: &'a S,
    estimator: &'a TokenEstimator,
    limits: CompactionLimits,
}

impl<'a, S: Summarizer> Compactor<'a, S> {
    pub fn new(summarizer: &'a S, estimator: &'a TokenEstimator, limits: CompactionLimits) -> Self {
        Self {
            summarizer,
            estimator,
            limits,
        }
    }

    /// Collapse `texts` into at most roughly `budget` tokens
    ///
    /// Within budget the joined texts come back verbatim without a service
    /// call. Otherwise one summarization pass runs and its result is returned
    /// as is, even if it is itself over budget. If that call fails, the most
    /// recent texts that fit are returned instead, so the result is never an
    /// error.
    pub async fn compact(&self, texts: &[String], budget: usize, instructions: &str) -> String {
        if texts.is_empty() {
            return String::new();
        }

        let joined = texts.join(INSIGHT_SEPARATOR);
        let tokens = self.estimator.estimate(&joined);
        if tokens <= budget {
            return joined;
        }

        tracing::info!(
            "Insights collection ({} tokens) exceeds limit ({}). Compacting...",
            tokens,
            budget
        );

        let max_input = self
            .limits
            .input_ceiling
            .saturating_sub(self.estimator.estimate(instructions))
            .saturating_sub(self.limits.reserve);
        let input = if tokens > max_input {
            let truncated = self.estimator.truncate(&joined, max_input);
            tracing::warn!(
                "Insights for compaction truncated from {} to approx {} tokens",
                tokens,
                self.estimator.estimate(&truncated)
            );
            truncated
        } else {
            joined
        };

        let user = format!(
            "Please compact the following collection of insights according to the instructions:\n\n{}",
            input
        );

        match self
            .summarizer
            .complete(instructions, &user, self.limits.max_output_tokens)
            .await
        {
            Ok(summary) => {
                tracing::info!(
                    "Compaction successful. New token count for insights context: {}",
                    self.estimator.estimate(&summary)
                );
                summary
            }
            Err(e) => {
                tracing::warn!(
                    "Error during insights compaction: {}. Using the most recent insights that fit.",
                    e
                );
                recent_within_budget(texts, budget, self.estimator)
            }
        }
    }
}
