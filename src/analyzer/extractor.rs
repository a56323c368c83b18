//! Metric extraction orchestrator.
//!
//! The [`MetricExtractor`] decides the filetype from the artifacts present and
//! hands the parsed artifact to the per-format metric functions:
//!
//! - JSON report with a `VCFVersion` field: [`vcf`]
//! - any other JSON report: [`bamcram`], plus GC content from the encrypted
//!   statistics when enabled
//! - FastQC archive only: [`fastq`]
//! - nothing: the `no_qc` sentinel
//!
//! Every metric function returns a [`MetricResult`]; failures omit that key only.

pub mod bamcram;
pub mod fastq;
pub mod report;
pub mod stats;
pub mod vcf;

use super::error::{AnalysisError, MetricResult};
use super::types::{AnalysisResult, FileType, MetricRow, SentinelKind};
use super::Analyzer;
use crate::archive::ArtifactSet;
use crate::decrypt::{self, DEFAULT_STATS_LIMIT};
use report::QcReport;
use std::fs;
use tracing::debug;

/// Hard caps on decompressed artifact sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionLimits {
    /// Decompressed JSON report.
    pub json_bytes: u64,
    /// Uncompressed `fastqc_data.txt` entry.
    pub fastqc_bytes: u64,
    /// Decompressed, base64-armored statistics.
    pub stats_bytes: u64,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            json_bytes: report::DEFAULT_JSON_LIMIT,
            fastqc_bytes: fastq::DEFAULT_FASTQC_LIMIT,
            stats_bytes: DEFAULT_STATS_LIMIT,
        }
    }
}

/// Collects metric rows in order, dropping the ones that failed.
pub(crate) struct RowCollector<'a> {
    id: &'a str,
    rows: Vec<MetricRow>,
}

impl<'a> RowCollector<'a> {
    pub(crate) fn new(id: &'a str) -> Self {
        Self {
            id,
            rows: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, key: &'static str, value: MetricResult) {
        match value {
            Ok(v) => self.rows.push(MetricRow::new(key, v)),
            Err(e) => debug!(id = self.id, metric = key, error = %e, "metric omitted"),
        }
    }

    pub(crate) fn finish(self) -> Vec<MetricRow> {
        self.rows
    }
}

/// Analyzer extracting scalar QC metrics.
#[derive(Debug, Clone, Default)]
pub struct MetricExtractor {
    include_crypt: bool,
    limits: ExtractionLimits,
}

impl MetricExtractor {
    pub fn new(include_crypt: bool) -> Self {
        Self {
            include_crypt,
            limits: ExtractionLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ExtractionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Decrypted statistics text, when enabled and available.
    ///
    /// Failures are logged and yield `None`; only `gc_content` depends on this.
    fn decrypted_stats(&self, artifacts: &ArtifactSet) -> Option<String> {
        if !self.include_crypt {
            return None;
        }
        let (Some(stats), Some(key)) = (artifacts.encrypted_stats(), artifacts.passphrase()) else {
            return None;
        };

        let opened = fs::read(stats)
            .map_err(|e| AnalysisError::io(stats, e))
            .and_then(|compressed| {
                let passphrase = fs::read(key).map_err(|e| AnalysisError::io(key, e))?;
                decrypt::open_stats_artifact(&compressed, &passphrase, self.limits.stats_bytes)
                    .map_err(AnalysisError::from)
            });

        match opened {
            Ok(text) => Some(text),
            Err(e) => {
                debug!(id = %artifacts.id(), error = %e, "encrypted statistics unavailable");
                None
            }
        }
    }
}

impl Analyzer for MetricExtractor {
    fn name(&self) -> &'static str {
        "extract"
    }

    fn analyze(&self, artifacts: &ArtifactSet) -> Result<AnalysisResult, AnalysisError> {
        let id = artifacts.id().as_str();

        if let Some(path) = artifacts.json_report() {
            let report = QcReport::load(path, self.limits.json_bytes)?;
            if report.is_vcf() {
                return Ok(AnalysisResult::MetricRows {
                    filetype: FileType::Vcf,
                    rows: vcf::rows(id, &report),
                });
            }
            let stats = self.decrypted_stats(artifacts);
            return Ok(AnalysisResult::MetricRows {
                filetype: FileType::Bamcram,
                rows: bamcram::rows(id, &report, stats.as_deref()),
            });
        }

        if let Some(path) = artifacts.fastqc_archive() {
            let data = fastq::read_fastqc_data(path, self.limits.fastqc_bytes)?;
            return Ok(AnalysisResult::MetricRows {
                filetype: FileType::Fastq,
                rows: fastq::rows(id, &data),
            });
        }

        Ok(AnalysisResult::sentinel(SentinelKind::NoQc))
    }
}
