//! Run-wide counters and the terminal report.
//!
//! `SummaryCounters` is the only state shared across tasks, and only the
//! single consumer of completed findings updates it.

use crate::analyzer::classifier::log_key;
use crate::analyzer::{AnalysisResult, AnalyzerKind, FileType, Finding, SentinelKind};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

/// Aggregated outcome counts of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryCounters {
    kind: AnalyzerKind,
    pub processed: usize,
    pub missing_qc: usize,
    pub qc_present: usize,
    pub missing_no_error: usize,
    pub flagged: usize,
    pub log_matches: BTreeMap<String, usize>,
    pub total_matches: usize,
    pub rows_written: usize,
    pub filetypes: BTreeMap<FileType, usize>,
    pub sentinels: BTreeMap<SentinelKind, usize>,
    pub interrupted: bool,
}

impl SummaryCounters {
    pub fn new(kind: AnalyzerKind) -> Self {
        Self {
            kind,
            processed: 0,
            missing_qc: 0,
            qc_present: 0,
            missing_no_error: 0,
            flagged: 0,
            log_matches: BTreeMap::new(),
            total_matches: 0,
            rows_written: 0,
            filetypes: BTreeMap::new(),
            sentinels: BTreeMap::new(),
            interrupted: false,
        }
    }

    pub fn kind(&self) -> AnalyzerKind {
        self.kind
    }

    /// Fold one completed finding into the counters.
    pub fn record(&mut self, finding: &Finding) {
        self.processed += 1;

        match &finding.result {
            AnalysisResult::MetricRows { filetype, rows } => {
                *self.filetypes.entry(*filetype).or_default() += 1;
                self.rows_written += rows.len();
            }
            AnalysisResult::ErrorExcerpt { excerpts } => {
                self.missing_qc += 1;
                self.flagged += 1;
                for excerpt in excerpts {
                    *self
                        .log_matches
                        .entry(log_key(&excerpt.log_file).to_string())
                        .or_default() += excerpt.total_matches;
                    self.total_matches += excerpt.total_matches;
                }
            }
            AnalysisResult::MissingNoError => {
                self.missing_qc += 1;
                self.missing_no_error += 1;
            }
            AnalysisResult::QcPresent => {
                self.qc_present += 1;
            }
            AnalysisResult::Sentinel { sentinel } => {
                *self.sentinels.entry(*sentinel).or_default() += 1;
                if *sentinel == SentinelKind::NoQc {
                    self.missing_qc += 1;
                }
                if self.kind == AnalyzerKind::Extract {
                    self.rows_written += 1;
                }
            }
        }
    }

    fn percent(&self, count: usize) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            count as f64 / self.processed as f64 * 100.0
        }
    }

    /// Human-readable report; not a stable machine format.
    pub fn render(&self, elapsed: Duration) -> String {
        let mut out = String::new();

        if self.interrupted {
            out.push_str("Interrupted: results cover the batches completed so far.\n");
        }

        if self.processed == 0 {
            out.push_str("No files were checked.\n");
        } else {
            let _ = writeln!(out, "Finished checking {} files.", self.processed);
            let _ = writeln!(
                out,
                "{} files ({:.1}%) have a missing QC report.",
                self.missing_qc,
                self.percent(self.missing_qc)
            );
        }

        match self.kind {
            AnalyzerKind::Classify => self.render_classify(&mut out),
            AnalyzerKind::Extract => self.render_extract(&mut out),
        }

        if !self.sentinels.is_empty() {
            out.push_str("\nSentinels:\n");
            for (kind, count) in &self.sentinels {
                let _ = writeln!(out, "  {}: {}", kind, count);
            }
        }

        let _ = writeln!(out, "\nTime elapsed: {:.2} seconds.", elapsed.as_secs_f64());
        out
    }

    fn render_classify(&self, out: &mut String) {
        if self.processed > 0 {
            let _ = writeln!(
                out,
                "{} files ({:.1}%) show error evidence in their logs.",
                self.flagged,
                self.percent(self.flagged)
            );
            let _ = writeln!(
                out,
                "{} files ({:.1}%) have no error evidence.",
                self.missing_no_error,
                self.percent(self.missing_no_error)
            );
        }

        if !self.log_matches.is_empty() {
            out.push_str("\nErrors per log file:\n");
            for (log, count) in &self.log_matches {
                let _ = writeln!(out, "  {}: {}", log, count);
            }
        }
        let _ = writeln!(out, "Total errors: {}", self.total_matches);
    }

    fn render_extract(&self, out: &mut String) {
        let _ = writeln!(out, "Wrote {} rows.", self.rows_written);

        if !self.filetypes.is_empty() {
            out.push_str("\nFiles per type:\n");
            for (filetype, count) in &self.filetypes {
                let _ = writeln!(out, "  {}: {}", filetype, count);
            }
        }
    }
}
