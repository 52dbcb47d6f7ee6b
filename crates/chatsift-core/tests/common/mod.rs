#![allow(dead_code)]

use chatsift_compress::{FailureKind, SummarizeError, Summarizer, TokenEstimator};
use chatsift_core::{prompts, Pipeline, PipelineConfig};
use chatsift_store::ChatPaths;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

pub const BASE_TS: i64 = 1_700_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Chunk,
    Compact,
    Report,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub kind: CallKind,
    pub user: String,
}

type Handler = Box<dyn Fn(CallKind, usize, &str) -> Result<String, SummarizeError>>;

/// Summarizer double: answers through a handler that sees the call kind,
/// how many calls of that kind came before, and the user content
pub struct Scripted {
    handler: Handler,
    pub calls: RefCell<Vec<Call>>,
}

impl Scripted {
    pub fn new(handler: impl Fn(CallKind, usize, &str) -> Result<String, SummarizeError> + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.user.clone())
            .collect()
    }
}

impl Summarizer for Scripted {
    async fn complete(&self, system: &str, user: &str, _max_tokens: u32) -> Result<String, SummarizeError> {
        let kind = if system == prompts::CHUNK_INSIGHTS {
            CallKind::Chunk
        } else if system == prompts::COMPACT_INSIGHTS {
            CallKind::Compact
        } else if system == prompts::FINAL_REPORT {
            CallKind::Report
        } else {
            panic!("unexpected system prompt: {}", system);
        };
        let seen = self.calls.borrow().iter().filter(|c| c.kind == kind).count();
        self.calls.borrow_mut().push(Call {
            kind,
            user: user.to_string(),
        });
        (self.handler)(kind, seen, user)
    }
}

pub fn failure(kind: FailureKind) -> SummarizeError {
    SummarizeError {
        kind,
        message: "stubbed failure".to_string(),
        attempts: 1,
    }
}

/// Note ids mentioned in the chunk part of an extraction prompt
pub fn chunk_note_ids(user: &str) -> Vec<i64> {
    let chunk = user
        .split("Current Message Chunk:\n")
        .nth(1)
        .unwrap_or("");
    chunk
        .lines()
        .filter_map(|line| line.rsplit("note ").next())
        .filter_map(|id| id.trim().parse().ok())
        .collect()
}

/// Deterministic insight text for a chunk, independent of the running context
pub fn insight_for(user: &str) -> String {
    let ids = chunk_note_ids(user);
    format!(
        "- notes {} to {} discussed",
        ids.first().copied().unwrap_or(0),
        ids.last().copied().unwrap_or(0)
    )
}

pub fn message(id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "type": "message",
        "date": format!("2023-11-14T22:{:02}:00", id % 60),
        "date_unixtime": (BASE_TS + id).to_string(),
        "from": format!("User{}", id % 3),
        "text": format!("note {}", id)
    })
}

/// Write a Telegram-style export holding messages `ids`
pub fn write_export(folder: &Path, file_name: &str, ids: impl IntoIterator<Item = i64>) -> PathBuf {
    let messages: Vec<serde_json::Value> = ids.into_iter().map(message).collect();
    let export = serde_json::json!({
        "name": "Test Chat",
        "type": "private_group",
        "messages": messages
    });
    let path = folder.join(file_name);
    std::fs::write(&path, serde_json::to_string_pretty(&export).unwrap()).unwrap();
    path
}

pub fn chat_folder(root: &Path, name: &str) -> ChatPaths {
    let folder = root.join(name);
    std::fs::create_dir_all(&folder).unwrap();
    ChatPaths::new(&folder).unwrap()
}

pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        chunk_size: 50,
        ..PipelineConfig::new()
    }
}

pub fn pipeline(summarizer: Scripted, config: PipelineConfig) -> Pipeline<Scripted> {
    Pipeline::new(summarizer, config).with_estimator(TokenEstimator::heuristic())
}

/// Chunk insights for every chunk; reports echo their input
pub fn echo_handler(kind: CallKind, _seen: usize, user: &str) -> Result<String, SummarizeError> {
    match kind {
        CallKind::Chunk => Ok(insight_for(user)),
        CallKind::Compact => Ok("- compacted summary".to_string()),
        CallKind::Report => Ok(format!("REPORT\n{}", user)),
    }
}
