//! Sequential chunk-by-chunk insight extraction

use crate::config::PipelineConfig;
use crate::export::ChatLine;
use crate::prompts;
use chatsift_compress::{Compactor, SummarizeError, Summarizer, TokenEstimator};
use chatsift_store::{Insight, InsightStore, NO_NEW_INSIGHTS};
use chrono::Utc;

/// What one pass over the new records achieved
#[derive(Debug, Default)]
pub struct ChunkReport {
    pub chunks_total: usize,
    /// Chunks whose outcome is durably recorded
    pub chunks_processed: usize,
    pub insights_added: usize,
    /// Failure that stopped the loop early
    pub aborted: Option<SummarizeError>,
}

impl ChunkReport {
    pub fn completed(&self) -> bool {
        self.aborted.is_none()
    }
}

pub struct ChunkProcessor<'a, S> {
    summarizer: &'a S,
    estimator: &'a TokenEstimator,
    config: &'a PipelineConfig,
}

impl<'a, S: Summarizer> ChunkProcessor<'a, S> {
    pub fn new(summarizer: &'a S, estimator: &'a TokenEstimator, config: &'a PipelineConfig) -> Self {
        Self {
            summarizer,
            estimator,
            config,
        }
    }

    fn compactor(&self) -> Compactor<'a, S> {
        Compactor::new(self.summarizer, self.estimator, self.config.compaction_limits())
    }

    /// Running context for the next chunk, rebuilt from every stored insight
    pub async fn running_context(&self, store: &InsightStore) -> String {
        self.compactor()
            .compact(
                &store.insight_texts(),
                self.config.chunk_context_budget,
                prompts::COMPACT_INSIGHTS,
            )
            .await
    }

    /// Extract insights from `lines`, one chunk at a time
    ///
    /// Each chunk's outcome and the cursor advance are saved before the next
    /// chunk starts. The first summarization failure stops the loop; chunks
    /// already recorded stay recorded.
    pub async fn process(&self, store: &mut InsightStore, lines: &[ChatLine]) -> ChunkReport {
        let chunk_size = self.config.chunk_size.max(1);
        let mut report = ChunkReport {
            chunks_total: lines.len().div_ceil(chunk_size),
            ..ChunkReport::default()
        };

        let mut context = self.running_context(store).await;

        for (index, chunk) in lines.chunks(chunk_size).enumerate() {
            let (first, last) = match (chunk.first(), chunk.last()) {
                (Some(first), Some(last)) => (first, last),
                _ => continue,
            };
            tracing::info!(
                "Processing chunk {}/{} (messages {} to {})",
                index + 1,
                report.chunks_total,
                first.id,
                last.id
            );

            let prompt = chunk_prompt(&context, chunk);
            let reply = match self
                .summarizer
                .complete(prompts::CHUNK_INSIGHTS, &prompt, self.config.chunk_output_tokens)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::error!("Error generating insight for chunk {}: {}", index + 1, e);
                    report.aborted = Some(e);
                    break;
                }
            };

            let has_insight = reply.trim() != NO_NEW_INSIGHTS;
            if has_insight {
                tracing::info!("Insight for chunk {}: {}", index + 1, preview(&reply));
                store.push_insight(Insight {
                    chunk_start_message_id: first.id,
                    chunk_end_message_id: last.id,
                    chunk_start_message_timestamp_unix: first.timestamp,
                    chunk_end_message_timestamp_unix: last.timestamp,
                    chunk_start_message_timestamp_utc: first.date.clone(),
                    chunk_end_message_timestamp_utc: last.date.clone(),
                    insight_text: reply,
                    generated_at_utc: Utc::now(),
                });
                report.insights_added += 1;
            } else {
                tracing::info!("No new salient insights in chunk {}", index + 1);
            }

            store.advance_cursor(last.position());
            if store.save_or_log() {
                tracing::debug!("Progress saved. Last processed id: {}", last.id);
            }
            report.chunks_processed += 1;

            if has_insight {
                context = self.running_context(store).await;
            }
        }

        report
    }
}

/// User content for one extraction call
pub fn chunk_prompt(context: &str, chunk: &[ChatLine]) -> String {
    let context = if context.is_empty() {
        "No previous summary available."
    } else {
        context
    };
    let chunk_text = chunk
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Previous Conversation Summary:\n{}\n\n---\n\nCurrent Message Chunk:\n{}",
        context, chunk_text
    )
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(150).collect();
    if head.len() < text.len() {
        format!("{}...", head)
    } else {
        head
    }
}
