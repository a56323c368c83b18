//! Result sinks.
//!
//! A sink is owned by the scheduler thread and is the only writer of its
//! destinations, so records are never interleaved.

pub mod excerpt;
pub mod table;

pub use excerpt::ExcerptSink;
pub use table::MetricTableSink;

use crate::analyzer::Finding;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of an output destination; always fatal for the run.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create output {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("failed to write table: {0}")]
    Csv(#[from] csv::Error),
}

/// Serializes completed findings to durable output.
pub trait ResultSink {
    /// Append the record(s) for one finding.
    fn write(&mut self, finding: &Finding) -> Result<(), SinkError>;

    /// Push buffered records to the destination.
    fn flush(&mut self) -> Result<(), SinkError>;
}

pub(crate) fn create_file(path: &std::path::Path) -> Result<std::fs::File, SinkError> {
    std::fs::File::create(path).map_err(|source| SinkError::Create {
        path: path.to_path_buf(),
        source,
    })
}
