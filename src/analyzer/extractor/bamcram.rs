//! BAM/CRAM metrics from the JSON QC report.

use super::report::{first_number, number, QcReport};
use super::stats;
use super::RowCollector;
use crate::analyzer::error::{MetricError, MetricResult};
use crate::analyzer::types::MetricRow;
use serde_json::Value;

/// Highest mapping quality counted as low quality.
pub const LOW_MAPQ_MAX: f64 = 29.0;

/// Metric rows in table order: insert_size, unaligned, mapq, duplicate_reads, gc_content.
pub fn rows(id: &str, report: &QcReport, stats_text: Option<&str>) -> Vec<MetricRow> {
    let mut rows = RowCollector::new(id);
    rows.push("insert_size", insert_size(report));
    rows.push("unaligned", unaligned(report));
    rows.push("mapq", mapq(report));
    rows.push("duplicate_reads", duplicate_reads(report));
    if let Some(text) = stats_text {
        rows.push("gc_content", stats::mean_gc(text));
    }
    rows.finish()
}

/// Mean insert size, reported as-is.
pub fn insert_size(report: &QcReport) -> MetricResult {
    number(report.top("InsertSize"), "InsertSize")
}

/// Percentage of unmapped reads: `100 - MappedReads[0] * 100`.
pub fn unaligned(report: &QcReport) -> MetricResult {
    first_number(report.data("MappedReads"), "Data.MappedReads").map(|ratio| 100.0 - ratio * 100.0)
}

/// Percentage of duplicate reads: `Duplicates[0] * 100`.
pub fn duplicate_reads(report: &QcReport) -> MetricResult {
    first_number(report.data("Duplicates"), "Data.Duplicates").map(|ratio| ratio * 100.0)
}

/// Percentage of alignments with mapping quality <= 29.
///
/// Uses the per-alignment distribution as both numerator and denominator, so
/// secondary and multi-mapped alignments do not skew the ratio.
pub fn mapq(report: &QcReport) -> MetricResult {
    const FIELD: &str = "Data.MappingQualityDistribution";

    let Some(value) = report.data("MappingQualityDistribution").filter(|v| !v.is_null()) else {
        return Err(MetricError::Absent(FIELD));
    };
    let histogram = parse_histogram(value).map_err(|reason| MetricError::malformed(FIELD, reason))?;
    low_mapq_percent(&histogram)
        .ok_or_else(|| MetricError::malformed(FIELD, "histogram holds no alignments"))
}

/// `(quality, count)` pairs from `[[q, n], ...]`.
fn parse_histogram(value: &Value) -> Result<Vec<(f64, f64)>, String> {
    let buckets = value
        .as_array()
        .ok_or_else(|| format!("expected an array, got {}", value))?;

    buckets
        .iter()
        .map(|bucket| match bucket.as_array().map(Vec::as_slice) {
            Some([q, n]) => match (q.as_f64(), n.as_f64()) {
                (Some(q), Some(n)) => Ok((q, n)),
                _ => Err(format!("non-numeric bucket {}", bucket)),
            },
            _ => Err(format!("expected [quality, count], got {}", bucket)),
        })
        .collect()
}

/// Low-quality share of a histogram in percent, `None` when it is empty.
pub fn low_mapq_percent(histogram: &[(f64, f64)]) -> Option<f64> {
    let total: f64 = histogram.iter().map(|(_, n)| n).sum();
    if total <= 0.0 {
        return None;
    }
    let low: f64 = histogram
        .iter()
        .filter(|(q, _)| *q <= LOW_MAPQ_MAX)
        .map(|(_, n)| n)
        .sum();
    Some(low / total * 100.0)
}
