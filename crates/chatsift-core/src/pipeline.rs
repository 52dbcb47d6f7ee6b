//! One run over a chat folder: discover, extract, report, record

use crate::config::PipelineConfig;
use crate::export;
use crate::processor::ChunkProcessor;
use crate::prompts;
use crate::report::{ReportOutcome, ReportSynthesizer};
use chatsift_compress::{Summarizer, TokenEstimator};
use chatsift_store::{append_jsonl, ChatPaths, InsightStore, RunOutcome, RunRecord};
use chrono::Utc;
use std::path::Path;

pub struct Pipeline<S> {
    summarizer: S,
    estimator: TokenEstimator,
    config: PipelineConfig,
}

impl<S: Summarizer> Pipeline<S> {
    pub fn new(summarizer: S, config: PipelineConfig) -> Self {
        let estimator = TokenEstimator::for_model(&config.model);
        Self {
            summarizer,
            estimator,
            config,
        }
    }

    pub fn with_estimator(mut self, estimator: TokenEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn summarizer(&self) -> &S {
        &self.summarizer
    }

    fn open_store(&self, paths: &ChatPaths) -> InsightStore {
        let mut store = InsightStore::load(&paths.state_file());
        store.record_prompts(prompts::recorded());
        store
    }

    fn synthesizer<'a>(&'a self, paths: &'a ChatPaths) -> ReportSynthesizer<'a, S> {
        ReportSynthesizer::new(&self.summarizer, &self.estimator, &self.config, paths)
    }

    /// Process the newest export in `paths` and refresh the report
    ///
    /// Progress is saved chunk by chunk, so an interrupted or aborted run can
    /// simply be repeated.
    pub async fn run(&self, paths: &ChatPaths) -> RunRecord {
        let started_at = Utc::now();
        let mut store = self.open_store(paths);
        let cursor = store.cursor();
        tracing::info!(
            "Processing {}: last processed id {}, timestamp {}",
            paths.name,
            cursor.id,
            cursor.timestamp
        );

        let mut record = RunRecord {
            started_at,
            finished_at: started_at,
            export_file: None,
            new_records: 0,
            chunks_processed: 0,
            insights_added: 0,
            outcome: RunOutcome::NoExport,
            report_file: None,
        };

        let Some(export_path) = paths.latest_export() else {
            tracing::info!("No export files found to process");
            let report = self.synthesizer(paths).synthesize(&mut store, false, false).await;
            record.report_file = report.file_name().map(String::from);
            return self.finish(paths, record);
        };
        tracing::info!("Processing export file {}", export_path.display());
        record.export_file = Some(export_path.clone());

        let batch = export::load_export(&export_path, cursor);
        if batch.lines.is_empty() {
            tracing::info!("No new messages in the export after filtering");
            if batch.newest.is_some_and(|newest| newest <= store.cursor()) {
                tracing::info!("Export {} already fully processed", export_path.display());
                self.remove_export(&export_path);
            }
            let report = self.synthesizer(paths).synthesize(&mut store, false, false).await;
            record.report_file = report.file_name().map(String::from);
            record.outcome = RunOutcome::NoNewRecords;
            return self.finish(paths, record);
        }

        record.new_records = batch.lines.len();
        tracing::info!("Found {} new messages to process", batch.lines.len());

        let processor = ChunkProcessor::new(&self.summarizer, &self.estimator, &self.config);
        let chunks = processor.process(&mut store, &batch.lines).await;
        record.chunks_processed = chunks.chunks_processed;
        record.insights_added = chunks.insights_added;

        if let Some(err) = &chunks.aborted {
            tracing::error!(
                "Chunk processing stopped after {}/{} chunks: {}. Progress is saved; re-run to continue. Export {} kept.",
                chunks.chunks_processed,
                chunks.chunks_total,
                err,
                export_path.display()
            );
            record.outcome = RunOutcome::Aborted;
            return self.finish(paths, record);
        }

        let report = self
            .synthesizer(paths)
            .synthesize(&mut store, chunks.insights_added > 0, false)
            .await;
        record.report_file = report.file_name().map(String::from);
        if report.is_success() {
            record.outcome = RunOutcome::Completed;
            self.remove_export(&export_path);
        } else {
            tracing::warn!(
                "Report generation failed; export {} kept",
                export_path.display()
            );
            record.outcome = RunOutcome::ReportFailed;
        }

        self.finish(paths, record)
    }

    /// Regenerate the report without touching any export
    pub async fn regenerate_report(&self, paths: &ChatPaths, force: bool) -> ReportOutcome {
        let mut store = self.open_store(paths);
        self.synthesizer(paths).synthesize(&mut store, false, force).await
    }

    fn remove_export(&self, path: &Path) {
        if self.config.keep_exports {
            return;
        }
        match std::fs::remove_file(path) {
            Ok(()) => tracing::info!("Deleted export file {}", path.display()),
            Err(e) => tracing::warn!("Error deleting export file {}: {}", path.display(), e),
        }
    }

    fn finish(&self, paths: &ChatPaths, mut record: RunRecord) -> RunRecord {
        record.finished_at = Utc::now();
        if let Err(e) = append_jsonl(&paths.runs_file(), &record) {
            tracing::warn!("Error recording run history: {}", e);
        }
        tracing::info!("Finished {}: {}", paths.name, record.outcome);
        record
    }
}
