//! Path resolution for a chat folder

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Resolves the files that live inside one chat folder
#[derive(Debug, Clone)]
pub struct ChatPaths {
    pub folder: PathBuf,
    pub name: String,
}

impl ChatPaths {
    /// Resolve a chat folder; it must exist and be a directory
    pub fn new(folder: impl AsRef<Path>) -> std::io::Result<Self> {
        let folder = std::fs::canonicalize(folder.as_ref())?;
        if !folder.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", folder.display()),
            ));
        }

        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chat".to_string());

        Ok(Self { folder, name })
    }

    /// File name of the state snapshot
    pub fn state_file_name(&self) -> String {
        format!("{}-state.json", self.name)
    }

    /// Get `<name>-state.json` path
    pub fn state_file(&self) -> PathBuf {
        self.folder.join(self.state_file_name())
    }

    /// Get `<name>-runs.jsonl` path
    pub fn runs_file(&self) -> PathBuf {
        self.folder.join(format!("{}-runs.jsonl", self.name))
    }

    /// Report file name stamped with the given local time
    pub fn report_file_name(&self, at: DateTime<Local>) -> String {
        format!("{}-Report-{}.txt", self.name, at.format("%Y-%m-%d_%H%M%S"))
    }

    pub fn report_path(&self, file_name: &str) -> PathBuf {
        self.folder.join(file_name)
    }

    /// Most recently modified `*.json` export in the folder, ignoring the
    /// state snapshot
    pub fn latest_export(&self) -> Option<PathBuf> {
        let state_name = self.state_file_name();
        let entries = std::fs::read_dir(&self.folder).ok()?;

        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
            .filter(|path| {
                path.file_name().and_then(|n| n.to_str()) != Some(state_name.as_str())
            })
            .filter_map(|path| {
                let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((modified, path))
            })
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, path)| path)
    }
}
