//! Configuration for the digestion pipeline

use chatsift_compress::{CompactionLimits, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Longest accepted backoff delay, one day
pub const MAX_RETRY_DELAY_SECS: f64 = 86_400.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("ANTHROPIC_API_KEY is not set or is still a placeholder value")]
    MissingApiKey,
}

/// Backoff settings as they appear in a config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_secs: f64,
    pub max_delay_secs: f64,
    pub jitter: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 5.0,
            max_delay_secs: 120.0,
            jitter: 0.2,
        }
    }
}

/// Every tunable of a run, fixed at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Model identity, also used to pick the tokenizer
    pub model: String,

    /// Records per chunk
    pub chunk_size: usize,

    /// Running-context budget while extracting chunk insights
    pub chunk_context_budget: usize,

    /// Ceiling on a single compaction request
    pub compaction_input_ceiling: usize,

    /// Headroom kept below the compaction ceiling
    pub compaction_reserve: usize,

    /// Insights per group in tier-2 report compaction
    pub report_group_size: usize,

    /// Report input size that triggers tier-2 compaction
    pub report_input_ceiling: usize,

    pub chunk_output_tokens: u32,
    pub compaction_output_tokens: u32,
    pub group_summary_output_tokens: u32,
    pub report_output_tokens: u32,

    pub retry: RetrySettings,

    pub request_timeout_secs: u64,

    /// Leave processed export files in place
    pub keep_exports: bool,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self {
            model: "claude-3-5-sonnet-20240620".to_string(),
            chunk_size: 50,
            chunk_context_budget: 100_000,
            compaction_input_ceiling: 150_000,
            compaction_reserve: 2_000,
            report_group_size: 30,
            report_input_ceiling: 180_000,
            chunk_output_tokens: 1_500,
            compaction_output_tokens: 3_000,
            group_summary_output_tokens: 2_000,
            report_output_tokens: 4_000,
            retry: RetrySettings::default(),
            request_timeout_secs: 600,
            keep_exports: false,
        }
    }

    /// Default location of the user config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chatsift").join("config.json"))
    }

    /// Defaults overlaid with `path`, or with the default config file when
    /// `path` is `None` and that file exists
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                tracing::debug!("Loaded config from {}", path.display());
                serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })?
            }
            None => Self::new(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be positive".to_string()));
        }
        if self.report_group_size == 0 {
            return Err(ConfigError::Invalid(
                "report_group_size must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.retry.jitter) {
            return Err(ConfigError::Invalid(
                "retry.jitter must be in [0, 1)".to_string(),
            ));
        }
        for (name, secs) in [
            ("retry.base_delay_secs", self.retry.base_delay_secs),
            ("retry.max_delay_secs", self.retry.max_delay_secs),
        ] {
            if !(0.0..=MAX_RETRY_DELAY_SECS).contains(&secs) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be between 0 and {} seconds",
                    name, MAX_RETRY_DELAY_SECS
                )));
            }
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: delay_from_secs(self.retry.base_delay_secs),
            max_delay: delay_from_secs(self.retry.max_delay_secs),
            jitter: self.retry.jitter,
        }
    }

    pub fn compaction_limits(&self) -> CompactionLimits {
        CompactionLimits {
            input_ceiling: self.compaction_input_ceiling,
            reserve: self.compaction_reserve,
            max_output_tokens: self.compaction_output_tokens,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamped into the accepted range; NaN becomes zero
fn delay_from_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.clamp(0.0, MAX_RETRY_DELAY_SECS)).unwrap_or_default()
}

/// API key from the environment, rejecting blanks and placeholders
pub fn api_key_from_env() -> Result<String, ConfigError> {
    let key = std::env::var(API_KEY_VAR).unwrap_or_default();
    let key = key.trim();
    if key.is_empty() || key == "YOUR KEY GOES HERE" || key.starts_with("sk-ant-api03-xxx") {
        return Err(ConfigError::MissingApiKey);
    }
    Ok(key.to_string())
}
