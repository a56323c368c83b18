//! GC content from decrypted samtools statistics.
//!
//! The `GCF` (first fragments) and `GCL` (last fragments) sections are
//! histograms of `GC<F|L>\t<gc percent>\t<count>` lines; the result is the
//! count-weighted mean GC percentage over both.

use crate::analyzer::error::{MetricError, MetricResult};

const FIELD: &str = "stats.GCF/GCL";

/// Count-weighted mean GC percentage over the GCF and GCL histograms.
pub fn mean_gc(text: &str) -> MetricResult {
    let mut weighted = 0.0;
    let mut total = 0.0;

    for line in text.lines() {
        let mut fields = line.split_whitespace();
        if !matches!(fields.next(), Some("GCF") | Some("GCL")) {
            continue;
        }
        let (Some(gc), Some(count), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(MetricError::malformed(FIELD, format!("unexpected line {:?}", line)));
        };
        let gc: f64 = gc
            .parse()
            .map_err(|_| MetricError::malformed(FIELD, format!("bad percentage {:?}", gc)))?;
        let count: f64 = count
            .parse()
            .map_err(|_| MetricError::malformed(FIELD, format!("bad count {:?}", count)))?;
        weighted += gc * count;
        total += count;
    }

    if total > 0.0 {
        Ok(weighted / total)
    } else {
        Err(MetricError::Absent(FIELD))
    }
}
