//! VCF metrics from the JSON QC report.

use super::report::{number, QcReport};
use super::RowCollector;
use crate::analyzer::error::MetricResult;
use crate::analyzer::types::MetricRow;

/// Metric rows in table order: tstv_ratio, avg_qual.
pub fn rows(id: &str, report: &QcReport) -> Vec<MetricRow> {
    let mut rows = RowCollector::new(id);
    rows.push("tstv_ratio", tstv_ratio(report));
    rows.push("avg_qual", avg_qual(report));
    rows.finish()
}

/// Transition/transversion ratio from `Data.TsTvRatio`, falling back to the top level.
pub fn tstv_ratio(report: &QcReport) -> MetricResult {
    let value = report
        .data("TsTvRatio")
        .filter(|v| !v.is_null())
        .or_else(|| report.top("TsTvRatio"));
    number(value, "TsTvRatio")
}

/// Average QUAL from the top-level `AvgQuality`, falling back to `Data.AvgQuality`.
pub fn avg_qual(report: &QcReport) -> MetricResult {
    let value = report
        .top("AvgQuality")
        .filter(|v| !v.is_null())
        .or_else(|| report.data("AvgQuality"));
    number(value, "AvgQuality")
}
