//! Final report synthesis over the whole insight collection

use crate::config::PipelineConfig;
use crate::prompts;
use chatsift_compress::{Summarizer, TokenEstimator, INSIGHT_SEPARATOR};
use chatsift_store::{atomic_write, ChatPaths, InsightStore};
use chrono::{Local, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// A valid report already covers the collection
    Skipped,
    /// Nothing substantive to report on; pointer cleared
    NoInsights,
    Written { file_name: String },
    Failed(String),
}

impl ReportOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ReportOutcome::Failed(_))
    }

    pub fn file_name(&self) -> Option<&str> {
        match self {
            ReportOutcome::Written { file_name } => Some(file_name),
            _ => None,
        }
    }
}

pub struct ReportSynthesizer<'a, S> {
    summarizer: &'a S,
    estimator: &'a TokenEstimator,
    config: &'a PipelineConfig,
    paths: &'a ChatPaths,
}

impl<'a, S: Summarizer> ReportSynthesizer<'a, S> {
    pub fn new(
        summarizer: &'a S,
        estimator: &'a TokenEstimator,
        config: &'a PipelineConfig,
        paths: &'a ChatPaths,
    ) -> Self {
        Self {
            summarizer,
            estimator,
            config,
            paths,
        }
    }

    /// Whether a report must be (re)generated
    pub fn is_due(&self, store: &InsightStore, insights_added: bool) -> bool {
        insights_added
            || (!store.insights().is_empty() && !store.has_valid_report(&self.paths.folder))
    }

    /// Generate, save and record a report when one is due, or always with
    /// `force`
    pub async fn synthesize(
        &self,
        store: &mut InsightStore,
        insights_added: bool,
        force: bool,
    ) -> ReportOutcome {
        if !force && !self.is_due(store, insights_added) {
            tracing::info!("Report generation not triggered: no new insights and a valid report exists");
            return ReportOutcome::Skipped;
        }

        let texts = store.substantive_texts();
        if texts.is_empty() {
            tracing::info!("No substantial insights available to generate a report");
            store.clear_report(Utc::now());
            store.save_or_log();
            return ReportOutcome::NoInsights;
        }

        let mut input = texts.join(INSIGHT_SEPARATOR);
        let tokens = self.estimator.estimate(&input);
        tracing::info!(
            "Report input: {} insights, {} tokens before tier-2 compaction",
            texts.len(),
            tokens
        );

        if tokens > self.config.report_input_ceiling {
            input = self.condense_groups(&texts).await;
            let condensed = self.estimator.estimate(&input);
            if condensed > self.config.report_input_ceiling {
                tracing::warn!(
                    "Report input still {} tokens after tier-2 compaction (ceiling {}); the report may be truncated",
                    condensed,
                    self.config.report_input_ceiling
                );
            }
        }

        let user = format!(
            "Using the following consolidated key insights, please generate the final report as per the detailed instructions:\n\n{}",
            input
        );
        let body = match self
            .summarizer
            .complete(prompts::FINAL_REPORT, &user, self.config.report_output_tokens)
            .await
        {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Error generating report text: {}", e);
                store.clear_report(Utc::now());
                store.save_or_log();
                return ReportOutcome::Failed(e.to_string());
            }
        };

        let now = Local::now();
        let file_name = self.paths.report_file_name(now);
        let document = render_document(&self.paths.name, now, &body);
        if let Err(e) = atomic_write(&self.paths.report_path(&file_name), document.as_bytes()) {
            tracing::error!("Error saving report {}: {}", file_name, e);
            store.clear_report(Utc::now());
            store.save_or_log();
            return ReportOutcome::Failed(e.to_string());
        }

        tracing::info!(
            "Report saved to {}",
            self.paths.report_path(&file_name).display()
        );
        store.set_report(file_name.clone(), Utc::now());
        store.save_or_log();
        ReportOutcome::Written { file_name }
    }

    /// Tier-2 compaction: summarize fixed-size groups of insights, keeping
    /// group order in the result
    async fn condense_groups(&self, texts: &[String]) -> String {
        let groups: Vec<&[String]> = texts.chunks(self.config.report_group_size.max(1)).collect();
        tracing::info!(
            "Splitting {} insights into {} groups for pre-report summarization",
            texts.len(),
            groups.len()
        );

        let mut summaries = Vec::with_capacity(groups.len());
        for (index, group) in groups.iter().enumerate() {
            let user = format!(
                "Please provide a concise summary of the following insights, which are part of a larger collection for a final report:\n\n{}",
                group.join(INSIGHT_SEPARATOR)
            );
            match self
                .summarizer
                .complete(
                    prompts::COMPACT_INSIGHTS,
                    &user,
                    self.config.group_summary_output_tokens,
                )
                .await
            {
                Ok(summary) => {
                    tracing::debug!("Group {}/{} summarized", index + 1, groups.len());
                    summaries.push(summary);
                }
                Err(e) => {
                    tracing::warn!(
                        "Error summarizing group {}: {}. This part may be missing from the report.",
                        index + 1,
                        e
                    );
                    summaries.push(format!("[Error summarizing meta-chunk {}: {}]", index + 1, e));
                }
            }
        }

        summaries.join(INSIGHT_SEPARATOR)
    }
}

/// Plain-text report document: header then body
pub fn render_document(subject: &str, generated: chrono::DateTime<Local>, body: &str) -> String {
    format!(
        "Final Report for: {}\nGenerated on: {}\n{}\n\n{}",
        subject,
        generated.format("%Y-%m-%d %I:%M:%S %p"),
        "=".repeat(30),
        body
    )
}
