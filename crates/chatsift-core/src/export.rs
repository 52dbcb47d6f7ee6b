//! Chat export reading: record extraction, cursor admission and line
//! rendering

use chatsift_store::Cursor;
use std::collections::HashMap;
use std::path::Path;

/// Longest quoted snippet of a replied-to message, in characters
pub const REPLY_SNIPPET_CHARS: usize = 75;

/// How a record's `from` field was present in the export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sender {
    Missing,
    Blank,
    Named(String),
}

impl Sender {
    fn from_value(value: Option<&serde_json::Value>) -> Self {
        match value {
            None => Sender::Missing,
            Some(v) => match v.as_str() {
                Some(s) if !s.is_empty() => Sender::Named(s.to_string()),
                _ => Sender::Blank,
            },
        }
    }

    pub fn display<'a>(&'a self, when_missing: &'a str) -> &'a str {
        match self {
            Sender::Missing => when_missing,
            Sender::Blank => "System",
            Sender::Named(name) => name,
        }
    }
}

/// One chat event as read from an export
#[derive(Debug, Clone)]
pub struct Record {
    pub id: i64,
    pub timestamp: i64,
    pub date: String,
    pub is_message: bool,
    pub sender: Sender,
    pub reply_to: Option<i64>,
    pub text: String,
    pub file: bool,
    pub file_name: Option<String>,
    pub photo: bool,
    pub sticker: bool,
    pub sticker_emoji: Option<String>,
}

impl Record {
    /// Parse one export entry; `None` when id or timestamp is not an integer
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let id = as_integer(value.get("id")?)?;
        let timestamp = as_integer(value.get("date_unixtime")?)?;

        Some(Self {
            id,
            timestamp,
            date: value
                .get("date")
                .and_then(|d| d.as_str())
                .unwrap_or("")
                .to_string(),
            is_message: value.get("type").and_then(|t| t.as_str()) == Some("message"),
            sender: Sender::from_value(value.get("from")),
            reply_to: value.get("reply_to_message_id").and_then(as_integer),
            text: message_text(value.get("text")),
            file: is_truthy(value.get("file")),
            file_name: non_empty_str(value.get("file_name")),
            photo: is_truthy(value.get("photo")),
            sticker: is_truthy(value.get("sticker")),
            sticker_emoji: non_empty_str(value.get("sticker_emoji")),
        })
    }

    pub fn position(&self) -> Cursor {
        Cursor::new(self.timestamp, self.id)
    }

    fn file_label(&self) -> &str {
        self.file_name.as_deref().unwrap_or("attachment")
    }

    /// Stand-in for a blank message when it is quoted by a reply
    fn quoted_placeholder(&self) -> Option<String> {
        if self.file {
            Some(format!("[File: {}]", self.file_label()))
        } else if self.photo {
            Some("[Photo]".to_string())
        } else if self.sticker {
            Some(match &self.sticker_emoji {
                Some(emoji) => format!("[Sticker {}]", emoji),
                None => "[Sticker]".to_string(),
            })
        } else {
            None
        }
    }

    /// What the sender contributed: text, or a note about the attachment
    fn own_content(&self) -> Option<String> {
        if !self.text.is_empty() {
            Some(self.text.clone())
        } else if self.file {
            Some(format!("[Sent a file: {}]", self.file_label()))
        } else if self.photo {
            Some("[Sent a photo]".to_string())
        } else if self.sticker {
            Some(match &self.sticker_emoji {
                Some(emoji) => format!("[Sent a sticker {}]", emoji),
                None => "[Sent a sticker]".to_string(),
            })
        } else {
            None
        }
    }
}

/// A new record rendered for the extraction prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub id: i64,
    pub timestamp: i64,
    pub date: String,
    pub text: String,
}

impl ChatLine {
    pub fn position(&self) -> Cursor {
        Cursor::new(self.timestamp, self.id)
    }
}

/// Records of one export that lie past the cursor
#[derive(Debug, Clone, Default)]
pub struct ExportBatch {
    pub lines: Vec<ChatLine>,
    /// Newest valid record in the file, of any type
    pub newest: Option<Cursor>,
    /// Entries dropped for a non-integer id or timestamp
    pub malformed: usize,
}

/// Read an export file; unreadable files yield an empty batch
pub fn load_export(path: &Path, cursor: Cursor) -> ExportBatch {
    let parsed = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).map_err(Into::into));

    match parsed {
        Ok(export) => select_new(&export, cursor),
        Err(e) => {
            tracing::error!("Error reading export file {}: {}", path.display(), e);
            ExportBatch::default()
        }
    }
}

/// Sort the export's records by (timestamp, id) and render those past
/// `cursor`
pub fn select_new(export: &serde_json::Value, cursor: Cursor) -> ExportBatch {
    let entries = match export.get("messages").and_then(|m| m.as_array()) {
        Some(entries) => entries,
        None => return ExportBatch::default(),
    };

    let mut records = Vec::with_capacity(entries.len());
    let mut malformed = 0;
    for entry in entries {
        match Record::from_value(entry) {
            Some(record) => records.push(record),
            None => malformed += 1,
        }
    }
    if malformed > 0 {
        tracing::warn!("Skipped {} malformed export entries", malformed);
    }

    records.sort_by_key(|r| r.position());

    let lookup: HashMap<i64, &Record> = records
        .iter()
        .filter(|r| r.is_message)
        .map(|r| (r.id, r))
        .collect();

    let lines = records
        .iter()
        .filter(|r| cursor.admits(r.timestamp, r.id))
        .filter(|r| r.is_message)
        .filter_map(|r| {
            render_line(r, &lookup).map(|text| ChatLine {
                id: r.id,
                timestamp: r.timestamp,
                date: r.date.clone(),
                text,
            })
        })
        .collect();

    ExportBatch {
        lines,
        newest: records.last().map(Record::position),
        malformed,
    }
}

/// Render a record as one prompt line, or `None` when it has nothing to say
pub fn render_line(record: &Record, lookup: &HashMap<i64, &Record>) -> Option<String> {
    let sender = record.sender.display("Unknown Sender");
    let mut prefix = format!("From {}:", sender);

    if let Some(original) = record.reply_to.and_then(|id| lookup.get(&id)) {
        let original_sender = original.sender.display("Original Sender");
        let quoted = if original.text.is_empty() {
            original.quoted_placeholder()
        } else {
            Some(original.text.clone())
        };
        if let Some(quoted) = quoted {
            prefix = format!(
                "From {} (replying to '{}: {}'):",
                sender,
                original_sender,
                snippet(&quoted)
            );
        }
    }

    record
        .own_content()
        .map(|content| format!("{} {}", prefix, content))
}

fn snippet(text: &str) -> String {
    if text.chars().count() > REPLY_SNIPPET_CHARS {
        let head: String = text.chars().take(REPLY_SNIPPET_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Message text from either a plain string or a list of entity segments
fn message_text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Array(segments)) => segments
            .iter()
            .map(|segment| match segment {
                serde_json::Value::String(s) => s.as_str(),
                serde_json::Value::Object(_) => segment["text"].as_str().unwrap_or(""),
                _ => "",
            })
            .collect::<String>()
            .trim()
            .to_string(),
        _ => String::new(),
    }
}

fn as_integer(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_truthy(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => !s.is_empty(),
        Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(serde_json::Value::Array(a)) => !a.is_empty(),
        Some(serde_json::Value::Object(o)) => !o.is_empty(),
    }
}

fn non_empty_str(value: Option<&serde_json::Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
}
