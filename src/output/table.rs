//! Delimited metric table written by extraction runs.

use super::{create_file, ResultSink, SinkError};
use crate::analyzer::{AnalysisResult, Finding, SentinelKind};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Column names of the metric table.
pub const HEADER: [&str; 4] = ["identifier", "filetype", "flag_key", "value"];

/// Writes one `identifier,filetype,flag_key,value` row per metric.
pub struct MetricTableSink<W: Write> {
    writer: csv::Writer<W>,
}

impl MetricTableSink<File> {
    /// Create (truncate) the table at `path` and write its header.
    pub fn create(path: &Path, delimiter: u8) -> Result<Self, SinkError> {
        Self::new(create_file(path)?, delimiter)
    }
}

impl<W: Write> MetricTableSink<W> {
    pub fn new(writer: W, delimiter: u8) -> Result<Self, SinkError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);
        writer.write_record(HEADER)?;
        Ok(Self { writer })
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}

impl<W: Write> ResultSink for MetricTableSink<W> {
    fn write(&mut self, finding: &Finding) -> Result<(), SinkError> {
        let id = finding.id.as_str();
        match &finding.result {
            AnalysisResult::MetricRows { filetype, rows } => {
                for row in rows {
                    self.writer.write_record([
                        id,
                        filetype.as_str(),
                        row.key.as_str(),
                        format_value(row.value).as_str(),
                    ])?;
                }
            }
            AnalysisResult::Sentinel { sentinel } => {
                self.writer.write_record([
                    id,
                    SentinelKind::FILETYPE,
                    sentinel.as_str(),
                    format_value(SentinelKind::VALUE).as_str(),
                ])?;
            }
            // classification outcomes carry no metrics
            _ => {}
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Shortest representation that parses back to the same value.
pub fn format_value(value: f64) -> String {
    format!("{}", value)
}
