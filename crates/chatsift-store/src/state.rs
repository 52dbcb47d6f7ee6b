//! Insight store: the append-only insight list, resumption cursor and
//! current-report pointer, persisted as one JSON snapshot

use crate::io::atomic_write;
use crate::types::{Cursor, Insight};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// On-disk shape of the state snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreState {
    pub last_processed_message_id: i64,
    pub last_processed_message_timestamp_unix: i64,
    pub individual_useful_insights: Vec<Insight>,
    pub latest_report_filename: Option<String>,
    pub report_generated_at_utc: Option<DateTime<Utc>>,
    pub system_prompts_used: BTreeMap<String, String>,
}

/// Owner of all insights and of the resumption cursor
///
/// Every mutation is in memory only; callers decide when to [`save`] so that
/// the cursor and the insight it covers land in the same snapshot.
///
/// [`save`]: InsightStore::save
#[derive(Debug)]
pub struct InsightStore {
    path: PathBuf,
    state: StoreState,
    prompts: BTreeMap<String, String>,
}

impl InsightStore {
    /// Load the snapshot at `path`, starting fresh when it is absent or
    /// unreadable
    pub fn load(path: &Path) -> Self {
        let state = if path.exists() {
            match std::fs::read_to_string(path)
                .map_err(anyhow::Error::from)
                .and_then(|raw| serde_json::from_str::<StoreState>(&raw).map_err(Into::into))
            {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!("Error loading {}: {}. Starting fresh.", path.display(), e);
                    StoreState::default()
                }
            }
        } else {
            StoreState::default()
        };

        Self {
            path: path.to_path_buf(),
            state,
            prompts: BTreeMap::new(),
        }
    }

    /// Instruction texts written into every snapshot for auditability
    pub fn record_prompts<I, K, V>(&mut self, prompts: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.prompts = prompts
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
    }

    /// Overwrite the snapshot on disk
    pub fn save(&mut self) -> Result<()> {
        for (key, prompt) in &self.prompts {
            self.state
                .system_prompts_used
                .insert(key.clone(), prompt.clone());
        }
        let json = serde_json::to_string_pretty(&self.state)?;
        atomic_write(&self.path, json.as_bytes())?;
        Ok(())
    }

    /// Save, logging instead of failing; progress continues in memory
    pub fn save_or_log(&mut self) -> bool {
        match self.save() {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error saving state to {}: {}", self.path.display(), e);
                false
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn cursor(&self) -> Cursor {
        Cursor::new(
            self.state.last_processed_message_timestamp_unix,
            self.state.last_processed_message_id,
        )
    }

    pub fn insights(&self) -> &[Insight] {
        &self.state.individual_useful_insights
    }

    /// All insight texts in chronological order
    pub fn insight_texts(&self) -> Vec<String> {
        self.insights()
            .iter()
            .map(|i| i.insight_text.clone())
            .collect()
    }

    /// Insight texts worth reporting on: non-empty and not the sentinel
    pub fn substantive_texts(&self) -> Vec<String> {
        self.insights()
            .iter()
            .filter(|i| i.is_substantive())
            .map(|i| i.insight_text.clone())
            .collect()
    }

    pub fn push_insight(&mut self, insight: Insight) {
        self.state.individual_useful_insights.push(insight);
    }

    /// Move the cursor forward; any existing report no longer covers the
    /// collection afterwards
    pub fn advance_cursor(&mut self, to: Cursor) {
        if to < self.cursor() {
            tracing::warn!(
                "Refusing to move cursor backwards from {:?} to {:?}",
                self.cursor(),
                to
            );
            return;
        }
        self.state.last_processed_message_id = to.id;
        self.state.last_processed_message_timestamp_unix = to.timestamp;
        self.invalidate_report();
    }

    /// Forget the report pointer without stamping a time
    pub fn invalidate_report(&mut self) {
        self.state.latest_report_filename = None;
        self.state.report_generated_at_utc = None;
    }

    /// Mark explicitly that no valid report exists as of `at`
    pub fn clear_report(&mut self, at: DateTime<Utc>) {
        self.state.latest_report_filename = None;
        self.state.report_generated_at_utc = Some(at);
    }

    pub fn set_report(&mut self, file_name: String, at: DateTime<Utc>) {
        self.state.latest_report_filename = Some(file_name);
        self.state.report_generated_at_utc = Some(at);
    }

    /// Whether the recorded report exists in `folder` and covers the
    /// current collection
    pub fn has_valid_report(&self, folder: &Path) -> bool {
        match (
            &self.state.latest_report_filename,
            &self.state.report_generated_at_utc,
        ) {
            (Some(name), Some(_)) => folder.join(name).exists(),
            _ => false,
        }
    }
}
