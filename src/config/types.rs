//! Configuration type definitions and defaults

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::analyzer::classifier::DEFAULT_MAX_EXCERPT_LINES;
use crate::analyzer::ErrorPatterns;
use crate::archive::DEFAULT_LOG_DIR;
use crate::pipeline::{PoolKind, WorkerConfig};

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("pipeline.batch_size must be > 0")]
    ZeroBatchSize,

    #[error("pipeline.max_workers must be > 0")]
    ZeroMaxWorkers,

    #[error("extract.delimiter must be a single ASCII character, got {0:?}")]
    Delimiter(String),

    #[error("classify.extra_patterns: {0}")]
    Pattern(#[from] regex::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub classify: ClassifyConfig,
}

/// Archive location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Archive root; `--root` overrides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Error-log subdirectory inside each execution directory
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

pub fn default_log_dir() -> String {
    DEFAULT_LOG_DIR.to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: None,
            log_dir: default_log_dir(),
        }
    }
}

/// Scheduling and worker pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Concurrent workers; 0 runs serially
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// None picks the per-mode default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub pool: PoolKind,
}

pub fn default_workers() -> usize {
    WorkerConfig::default().requested
}

pub fn default_max_workers() -> usize {
    WorkerConfig::default().max_workers
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_workers: default_max_workers(),
            batch_size: None,
            pool: PoolKind::Auto,
        }
    }
}

/// Metric extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Decrypt statistics artifacts for the gc_content metric
    #[serde(default)]
    pub include_crypt: bool,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

pub fn default_delimiter() -> String {
    ",".to_string()
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            include_crypt: false,
            delimiter: default_delimiter(),
        }
    }
}

impl ExtractConfig {
    /// The delimiter as the single byte the table writer needs.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        parse_delimiter(&self.delimiter)
    }
}

/// Parse a one-character ASCII delimiter; `\t` is accepted for tab.
pub fn parse_delimiter(raw: &str) -> Result<u8, ConfigError> {
    match raw.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        b"\\t" => Ok(b'\t'),
        _ => Err(ConfigError::Delimiter(raw.to_string())),
    }
}

/// Error-log classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Regexes added to the built-in error patterns
    #[serde(default)]
    pub extra_patterns: Vec<String>,
    #[serde(default = "default_max_excerpt_lines")]
    pub max_excerpt_lines: usize,
}

pub fn default_max_excerpt_lines() -> usize {
    DEFAULT_MAX_EXCERPT_LINES
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            extra_patterns: Vec::new(),
            max_excerpt_lines: default_max_excerpt_lines(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.batch_size == Some(0) {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.pipeline.max_workers == 0 {
            return Err(ConfigError::ZeroMaxWorkers);
        }
        self.extract.delimiter_byte()?;
        ErrorPatterns::with_extra(&self.classify.extra_patterns)?;
        Ok(())
    }
}
