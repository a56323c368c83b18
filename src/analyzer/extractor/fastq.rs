//! FASTQ metrics from a FastQC archive.
//!
//! The archive holds `stdin_fastqc/fastqc_data.txt`, a sequence of modules:
//!
//! ```text
//! >>Basic Statistics	pass
//! #Measure	Value
//! %GC	41
//! >>END_MODULE
//! ```

use super::RowCollector;
use crate::analyzer::error::{AnalysisError, MetricError, MetricResult};
use crate::analyzer::types::MetricRow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Upper bound for the uncompressed `fastqc_data.txt` entry.
pub const DEFAULT_FASTQC_LIMIT: u64 = 64 * 1024 * 1024;

/// Suffix identifying the data entry inside the archive.
pub const DATA_ENTRY_SUFFIX: &str = "fastqc_data.txt";

const BASIC_STATISTICS: &str = "Basic Statistics";
const DUPLICATION_LEVELS: &str = "Sequence Duplication Levels";
const SEQUENCE_QUALITY: &str = "Per sequence quality scores";

/// Lowest per-read mean quality counted as a high-quality read.
pub const HIGH_QUALITY_MIN: f64 = 30.0;

/// Read the `fastqc_data.txt` entry of a FastQC archive.
pub fn read_fastqc_data(path: &Path, limit: u64) -> Result<String, AnalysisError> {
    let file = File::open(path).map_err(|e| AnalysisError::io(path, e))?;
    let mut archive =
        zip::ZipArchive::new(BufReader::new(file)).map_err(|source| AnalysisError::Archive {
            path: path.to_path_buf(),
            source,
        })?;

    let name = archive
        .file_names()
        .find(|name| name.ends_with(DATA_ENTRY_SUFFIX))
        .map(str::to_string)
        .ok_or_else(|| AnalysisError::parse(path, "archive has no fastqc_data.txt entry"))?;

    let entry = archive
        .by_name(&name)
        .map_err(|source| AnalysisError::Archive {
            path: path.to_path_buf(),
            source,
        })?;
    if entry.size() > limit {
        return Err(AnalysisError::parse(
            path,
            format!("{} is {} bytes, limit is {}", name, entry.size(), limit),
        ));
    }

    let mut bytes = Vec::new();
    entry
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|e| AnalysisError::io(path, e))?;
    if bytes.len() as u64 > limit {
        return Err(AnalysisError::parse(path, format!("{} exceeds {} bytes", name, limit)));
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// `fastqc_data.txt` split into module bodies, keyed by module name.
#[derive(Debug, Default)]
pub struct FastqcData<'a> {
    modules: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> FastqcData<'a> {
    pub fn parse(text: &'a str) -> Self {
        let mut modules: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut current: Option<&str> = None;

        for line in text.lines().map(str::trim_end) {
            if line.starts_with(">>END_MODULE") {
                current = None;
            } else if let Some(header) = line.strip_prefix(">>") {
                let name = header.split('\t').next().unwrap_or(header);
                modules.entry(name).or_default();
                current = Some(name);
            } else if let Some(name) = current {
                modules.entry(name).or_default().push(line);
            }
        }

        Self { modules }
    }

    pub fn module(&self, name: &str) -> Option<&[&'a str]> {
        self.modules.get(name).map(Vec::as_slice)
    }

    /// Value column of the first module line starting with `label`.
    fn labeled_value(&self, module: &str, label: &str, field: &'static str) -> MetricResult {
        let line = self
            .module(module)
            .and_then(|lines| lines.iter().find(|l| l.starts_with(label)))
            .ok_or(MetricError::Absent(field))?;
        parse_column(line, 1, field)
    }
}

fn parse_column(line: &str, index: usize, field: &'static str) -> MetricResult {
    let raw = line
        .split('\t')
        .nth(index)
        .ok_or_else(|| MetricError::malformed(field, format!("missing column in {:?}", line)))?;
    raw.trim()
        .parse()
        .map_err(|_| MetricError::malformed(field, format!("not a number: {:?}", raw)))
}

/// Metric rows in table order: gc_content, duplicate_reads, quality_reads.
pub fn rows(id: &str, text: &str) -> Vec<MetricRow> {
    let data = FastqcData::parse(text);
    let mut rows = RowCollector::new(id);
    rows.push("gc_content", gc_content(&data));
    rows.push("duplicate_reads", duplicate_reads(&data));
    rows.push("quality_reads", quality_reads(&data));
    rows.finish()
}

/// Reported `%GC` of the Basic Statistics module.
pub fn gc_content(data: &FastqcData) -> MetricResult {
    data.labeled_value(BASIC_STATISTICS, "%GC", "Basic Statistics.%GC")
}

/// `100 - #Total Deduplicated Percentage`.
pub fn duplicate_reads(data: &FastqcData) -> MetricResult {
    data.labeled_value(
        DUPLICATION_LEVELS,
        "#Total Deduplicated Percentage",
        "Sequence Duplication Levels.#Total Deduplicated Percentage",
    )
    .map(|dedup| 100.0 - dedup)
}

/// Percentage of reads whose mean quality is at least 30.
pub fn quality_reads(data: &FastqcData) -> MetricResult {
    const FIELD: &str = "Per sequence quality scores";

    let lines = data.module(SEQUENCE_QUALITY).ok_or(MetricError::Absent(FIELD))?;
    let mut total = 0.0;
    let mut high = 0.0;
    for line in lines.iter().filter(|l| !l.starts_with('#') && !l.is_empty()) {
        let quality = parse_column(line, 0, FIELD)?;
        let count = parse_column(line, 1, FIELD)?;
        total += count;
        if quality >= HIGH_QUALITY_MIN {
            high += count;
        }
    }

    if total > 0.0 {
        Ok(high / total * 100.0)
    } else {
        Err(MetricError::malformed(FIELD, "no reads counted"))
    }
}
