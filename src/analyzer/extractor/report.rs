//! Gzip-compressed JSON QC report.

use crate::analyzer::error::{AnalysisError, MetricError, MetricResult};
use flate2::read::GzDecoder;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Upper bound for a decompressed JSON report.
pub const DEFAULT_JSON_LIMIT: u64 = 512 * 1024 * 1024;

/// A parsed QC report.
#[derive(Debug, Clone, PartialEq)]
pub struct QcReport {
    root: Value,
}

impl QcReport {
    /// Decompress and parse a report, refusing payloads larger than `limit`.
    pub fn load(path: &Path, limit: u64) -> Result<Self, AnalysisError> {
        let file = File::open(path).map_err(|e| AnalysisError::io(path, e))?;

        let mut text = Vec::new();
        GzDecoder::new(BufReader::new(file))
            .take(limit.saturating_add(1))
            .read_to_end(&mut text)
            .map_err(|e| AnalysisError::parse(path, format!("gzip: {}", e)))?;
        if text.len() as u64 > limit {
            return Err(AnalysisError::parse(
                path,
                format!("decompressed report exceeds {} bytes", limit),
            ));
        }

        let root = serde_json::from_slice(&text).map_err(|e| AnalysisError::parse(path, e.to_string()))?;
        Ok(Self { root })
    }

    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// A VCF report carries a `VCFVersion` key, whatever its value.
    pub fn is_vcf(&self) -> bool {
        self.top("VCFVersion").is_some()
    }

    /// Top-level field.
    pub fn top(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Field of the nested `Data` object.
    pub fn data(&self, key: &str) -> Option<&Value> {
        self.root.get("Data")?.get(key)
    }
}

/// Numeric value of a present field.
pub fn number(value: Option<&Value>, field: &'static str) -> MetricResult {
    match value {
        None | Some(Value::Null) => Err(MetricError::Absent(field)),
        Some(v) => v
            .as_f64()
            .ok_or_else(|| MetricError::malformed(field, format!("expected a number, got {}", v))),
    }
}

/// First element of a numeric array field (`[0.97, ...]`).
pub fn first_number(value: Option<&Value>, field: &'static str) -> MetricResult {
    match value {
        None | Some(Value::Null) => Err(MetricError::Absent(field)),
        Some(Value::Array(items)) => number(items.first(), field),
        Some(v) => Err(MetricError::malformed(
            field,
            format!("expected an array, got {}", v),
        )),
    }
}
