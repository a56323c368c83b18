//! Excerpt and identifier-list files written by classification runs.

use super::{create_file, ResultSink, SinkError};
use crate::analyzer::{AnalysisResult, Finding, LogExcerpt, SentinelKind};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes matched log lines for flagged identifiers, and the identifiers
/// missing QC without error evidence to a second destination.
pub struct ExcerptSink<W: Write> {
    excerpts: BufWriter<W>,
    missing: BufWriter<W>,
}

impl ExcerptSink<File> {
    /// Create (truncate) both output files.
    pub fn create(excerpts: &Path, missing: &Path) -> Result<Self, SinkError> {
        Ok(Self::new(create_file(excerpts)?, create_file(missing)?))
    }
}

impl<W: Write> ExcerptSink<W> {
    pub fn new(excerpts: W, missing: W) -> Self {
        Self {
            excerpts: BufWriter::new(excerpts),
            missing: BufWriter::new(missing),
        }
    }

    /// Flush and hand back `(excerpts, missing)`.
    pub fn into_inner(self) -> Result<(W, W), SinkError> {
        let excerpts = self.excerpts.into_inner().map_err(|e| e.into_error())?;
        let missing = self.missing.into_inner().map_err(|e| e.into_error())?;
        Ok((excerpts, missing))
    }

    fn write_excerpt(&mut self, excerpt: &LogExcerpt) -> Result<(), SinkError> {
        let noun = if excerpt.total_matches == 1 { "match" } else { "matches" };
        if excerpt.omitted() > 0 {
            writeln!(
                self.excerpts,
                "-- {} ({} {}, showing {})",
                excerpt.log_file,
                excerpt.total_matches,
                noun,
                excerpt.lines.len()
            )?;
        } else {
            writeln!(
                self.excerpts,
                "-- {} ({} {})",
                excerpt.log_file, excerpt.total_matches, noun
            )?;
        }
        for line in &excerpt.lines {
            writeln!(self.excerpts, "{}", line)?;
        }
        Ok(())
    }
}

impl<W: Write> ResultSink for ExcerptSink<W> {
    fn write(&mut self, finding: &Finding) -> Result<(), SinkError> {
        match &finding.result {
            AnalysisResult::ErrorExcerpt { excerpts } => {
                writeln!(self.excerpts, ">> {}", finding.id)?;
                for excerpt in excerpts {
                    self.write_excerpt(excerpt)?;
                }
                writeln!(self.excerpts)?;
            }
            AnalysisResult::MissingNoError => {
                writeln!(self.missing, "{}", finding.id)?;
            }
            AnalysisResult::Sentinel { sentinel } => {
                writeln!(
                    self.excerpts,
                    ">> {} | {} {}\n",
                    finding.id,
                    SentinelKind::FILETYPE,
                    sentinel
                )?;
            }
            AnalysisResult::QcPresent | AnalysisResult::MetricRows { .. } => {}
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.excerpts.flush()?;
        self.missing.flush()?;
        Ok(())
    }
}
