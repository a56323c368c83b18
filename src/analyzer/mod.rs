//! Analyzer plugins run once per identifier.
//!
//! Both analyzers implement the [`Analyzer`] trait and are consumed uniformly
//! by the pipeline:
//!
//! - [`ErrorClassifier`] explains missing QC reports from job logs
//! - [`MetricExtractor`] pulls scalar QC metrics out of FASTQ, BAM/CRAM and VCF reports
//!
//! # Module Structure
//!
//! - [`types`] - results crossing the worker boundary
//! - [`error`] - analysis and per-metric errors
//! - [`patterns`] - the error-line pattern set
//! - [`classifier`] / [`extractor`] - the two analyzers

pub mod classifier;
pub mod error;
pub mod extractor;
pub mod patterns;
pub mod types;

pub use classifier::ErrorClassifier;
pub use error::{AnalysisError, MetricError, MetricResult};
pub use extractor::MetricExtractor;
pub use patterns::{is_error_line, ErrorPatterns};
pub use types::{AnalysisResult, FileType, Finding, LogExcerpt, MetricRow, SentinelKind};

use crate::archive::{ArchiveLayout, ArtifactSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Capability shared by all analyzers.
///
/// Implementors must be thread-safe as one instance serves every worker
/// thread of a pool.
pub trait Analyzer: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Analyze the artifacts of one identifier.
    ///
    /// An `Err` fails this identifier only; the pipeline records it as a
    /// `worker_exception` sentinel.
    fn analyze(&self, artifacts: &ArtifactSet) -> Result<AnalysisResult, AnalysisError>;
}

/// Analyzer variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    Classify,
    Extract,
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzerKind::Classify => write!(f, "classify"),
            AnalyzerKind::Extract => write!(f, "extract"),
        }
    }
}

/// Everything needed to rebuild an analyzer, including inside a worker process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    pub kind: AnalyzerKind,
    pub root: PathBuf,
    pub log_dir: String,
    #[serde(default)]
    pub include_crypt: bool,
    #[serde(default)]
    pub extra_patterns: Vec<String>,
    #[serde(default = "default_max_excerpt_lines")]
    pub max_excerpt_lines: usize,
}

fn default_max_excerpt_lines() -> usize {
    classifier::DEFAULT_MAX_EXCERPT_LINES
}

impl AnalyzerSettings {
    pub fn new(kind: AnalyzerKind, root: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            root: root.into(),
            log_dir: crate::archive::DEFAULT_LOG_DIR.to_string(),
            include_crypt: false,
            extra_patterns: Vec::new(),
            max_excerpt_lines: default_max_excerpt_lines(),
        }
    }

    /// Archive layout the analyzer resolves identifiers against.
    pub fn layout(&self) -> ArchiveLayout {
        ArchiveLayout::new(&self.root).with_log_dir(&self.log_dir)
    }

    /// Create the analyzer these settings describe.
    pub fn create(&self) -> Result<Box<dyn Analyzer>, regex::Error> {
        let analyzer: Box<dyn Analyzer> = match self.kind {
            AnalyzerKind::Classify => Box::new(ErrorClassifier::new(
                ErrorPatterns::with_extra(&self.extra_patterns)?,
                self.max_excerpt_lines,
            )),
            AnalyzerKind::Extract => Box::new(MetricExtractor::new(self.include_crypt)),
        };
        Ok(analyzer)
    }
}
