//! Result types shared by the analyzers, the pipeline and the sinks.
//!
//! Every identifier yields exactly one terminal [`AnalysisResult`]. The
//! results cross the worker-process boundary as JSON, so all of them are
//! serde types.

use crate::archive::Identifier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Filetype of an analyzed QC bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Fastq,
    Bamcram,
    Vcf,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Fastq => "fastq",
            FileType::Bamcram => "bamcram",
            FileType::Vcf => "vcf",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an identifier produced a sentinel instead of a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentinelKind {
    /// Neither QC artifact exists.
    NoQc,
    /// The analyzer failed or panicked inside the task.
    WorkerException,
    /// The execution substrate lost the task (dead worker, broken pipe).
    FutureException,
}

impl SentinelKind {
    /// Filetype column value used for sentinel rows.
    pub const FILETYPE: &'static str = "__error__";

    /// Numeric value used for sentinel rows.
    pub const VALUE: f64 = -1.0;

    pub fn as_str(&self) -> &'static str {
        match self {
            SentinelKind::NoQc => "no_qc",
            SentinelKind::WorkerException => "worker_exception",
            SentinelKind::FutureException => "future_exception",
        }
    }
}

impl fmt::Display for SentinelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted scalar metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub key: String,
    pub value: f64,
}

impl MetricRow {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Matched lines of one error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogExcerpt {
    /// File name of the log inside the log directory.
    pub log_file: String,
    /// Matched lines in file order, possibly capped.
    pub lines: Vec<String>,
    /// Exact number of matching lines, even when `lines` was capped.
    pub total_matches: usize,
}

impl LogExcerpt {
    /// Number of matched lines that were not retained.
    pub fn omitted(&self) -> usize {
        self.total_matches.saturating_sub(self.lines.len())
    }
}

/// Terminal outcome of analyzing one identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisResult {
    /// Extracted metrics; individual keys may be missing.
    MetricRows {
        filetype: FileType,
        rows: Vec<MetricRow>,
    },
    /// Error evidence found in the logs, one excerpt per log file.
    ErrorExcerpt { excerpts: Vec<LogExcerpt> },
    /// QC is missing and the logs hold no error evidence.
    MissingNoError,
    /// A QC artifact exists; nothing to explain.
    QcPresent,
    /// Absent data or an internal failure.
    Sentinel { sentinel: SentinelKind },
}

impl AnalysisResult {
    pub fn sentinel(kind: SentinelKind) -> Self {
        AnalysisResult::Sentinel { sentinel: kind }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, AnalysisResult::Sentinel { .. })
    }
}

/// An analysis result tagged with the identifier it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: Identifier,
    pub result: AnalysisResult,
}

impl Finding {
    pub fn new(id: Identifier, result: AnalysisResult) -> Self {
        Self { id, result }
    }
}
