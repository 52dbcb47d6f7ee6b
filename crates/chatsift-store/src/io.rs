//! JSONL I/O and atomic file operations

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Append a JSON record to a JSONL file
pub fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let json = serde_json::to_string(record)?;
    writeln!(file, "{}", json)?;
    Ok(())
}

/// Read all records from a JSONL file, skipping lines that fail to parse
pub fn read_jsonl<T: for<'de> Deserialize<'de>>(path: &Path) -> std::io::Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::debug!("{}:{}: skipping malformed line: {}", path.display(), lineno + 1, e)
            }
        }
    }

    Ok(records)
}

/// Write data atomically using temp file + rename
///
/// The snapshot on disk is either the previous one or the new one, never a
/// partial write.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, data)?;
    std::fs::rename(temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Entry {
        id: u32,
        outcome: String,
    }

    #[test]
    fn test_jsonl_append_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("nested").join("runs.jsonl");

        let entries = vec![
            Entry {
                id: 1,
                outcome: "completed".to_string(),
            },
            Entry {
                id: 2,
                outcome: "aborted".to_string(),
            },
        ];

        for entry in &entries {
            append_jsonl(&log, entry).unwrap();
        }

        let read_back: Vec<Entry> = read_jsonl(&log).unwrap();
        assert_eq!(entries, read_back);
    }

    #[test]
    fn test_read_jsonl_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("runs.jsonl");
        std::fs::write(
            &log,
            "{\"id\":1,\"outcome\":\"completed\"}\nnot json\n\n{\"id\":2,\"outcome\":\"aborted\"}\n",
        )
        .unwrap();

        let read_back: Vec<Entry> = read_jsonl(&log).unwrap();
        assert_eq!(read_back.len(), 2);
        assert_eq!(read_back[1].id, 2);
    }

    #[test]
    fn test_read_jsonl_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let read_back: Vec<Entry> = read_jsonl(&dir.path().join("absent.jsonl")).unwrap();
        assert!(read_back.is_empty());
    }

    #[test]
    fn test_atomic_write_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("chat-state.json");

        atomic_write(&target, b"{\"v\":1}").unwrap();
        atomic_write(&target, b"{\"v\":2}").unwrap();

        let data = std::fs::read(&target).unwrap();
        assert_eq!(data, b"{\"v\":2}");
        assert!(!dir.path().join("chat-state.tmp").exists());
    }
}
