//! Insight, cursor and run-history record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Exact reply the extraction model gives when a chunk adds nothing
pub const NO_NEW_INSIGHTS: &str = "NO_NEW_INSIGHTS";

/// Resumption cursor: the last processed (timestamp, id) pair
///
/// Field order matters: the derived ordering is lexicographic on
/// `(timestamp, id)`, which is the admission test for new records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor {
    pub timestamp: i64,
    pub id: i64,
}

impl Cursor {
    pub fn new(timestamp: i64, id: i64) -> Self {
        Self { timestamp, id }
    }

    /// True when `(timestamp, id)` lies strictly after this cursor
    pub fn admits(&self, timestamp: i64, id: i64) -> bool {
        Cursor::new(timestamp, id) > *self
    }
}

/// Insight extracted from one chunk of records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub chunk_start_message_id: i64,
    pub chunk_end_message_id: i64,
    #[serde(default)]
    pub chunk_start_message_timestamp_unix: i64,
    #[serde(default)]
    pub chunk_end_message_timestamp_unix: i64,
    #[serde(default)]
    pub chunk_start_message_timestamp_utc: String,
    #[serde(default)]
    pub chunk_end_message_timestamp_utc: String,
    pub insight_text: String,
    pub generated_at_utc: DateTime<Utc>,
}

impl Insight {
    /// Whether this insight carries usable text for a report
    pub fn is_substantive(&self) -> bool {
        let text = self.insight_text.trim();
        !text.is_empty() && text != NO_NEW_INSIGHTS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every chunk processed and the report step succeeded
    Completed,
    /// Chunks processed but the report could not be produced
    ReportFailed,
    /// A summarization failure stopped the chunk loop
    Aborted,
    /// Export held nothing past the cursor
    NoNewRecords,
    /// No export file in the chat folder
    NoExport,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RunOutcome::Completed => "completed",
            RunOutcome::ReportFailed => "report_failed",
            RunOutcome::Aborted => "aborted",
            RunOutcome::NoNewRecords => "no_new_records",
            RunOutcome::NoExport => "no_export",
        };
        f.write_str(label)
    }
}

/// One line of the per-folder run history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default)]
    pub export_file: Option<PathBuf>,
    #[serde(default)]
    pub new_records: usize,
    #[serde(default)]
    pub chunks_processed: usize,
    #[serde(default)]
    pub insights_added: usize,
    pub outcome: RunOutcome,
    #[serde(default)]
    pub report_file: Option<String>,
}
