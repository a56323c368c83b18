//! Error types for analysis operations.
//!
//! Nothing here is fatal to a run. The pipeline swallows each error at the
//! smallest granularity that still makes sense:
//!
//! - `MetricError` omits a single metric key
//! - `AnalysisError` turns the whole identifier into a `worker_exception` sentinel

use crate::decrypt::DecryptError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of one analyzer invocation.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Artifact not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Corrupt archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Decryption failed: {0}")]
    Decrypt(#[from] DecryptError),
}

impl AnalysisError {
    /// IO failure on `path`. A file that vanished after resolution is `PathNotFound`.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return AnalysisError::PathNotFound(path.into());
        }
        AnalysisError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AnalysisError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Failure to produce one metric value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    #[error("field {0} is absent")]
    Absent(&'static str),

    #[error("field {field} is malformed: {reason}")]
    Malformed { field: &'static str, reason: String },
}

impl MetricError {
    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        MetricError::Malformed {
            field,
            reason: reason.into(),
        }
    }
}

/// Result of a single metric extraction.
pub type MetricResult = Result<f64, MetricError>;
