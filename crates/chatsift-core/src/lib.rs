//! Incremental chat digestion: chunked insight extraction, running-context
//! compaction and report synthesis

mod config;
pub mod export;
mod pipeline;
mod processor;
pub mod prompts;
mod report;

pub use config::{api_key_from_env, ConfigError, PipelineConfig, RetrySettings, API_KEY_VAR};
pub use export::{ChatLine, ExportBatch, Record, Sender};
pub use pipeline::Pipeline;
pub use processor::{chunk_prompt, ChunkProcessor, ChunkReport};
pub use report::{render_document, ReportOutcome, ReportSynthesizer};
