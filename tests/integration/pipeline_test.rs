//! End-to-end runs of the pipeline over temporary archives

use std::path::PathBuf;

use qcscan::analyzer::SentinelKind;
use qcscan::output::{ExcerptSink, MetricTableSink};
use qcscan::{run, AnalyzerKind, AnalyzerSettings, PoolKind, ProcessGuard, RunOptions};

use crate::helpers::{id_stream, Archive, FASTQC_DATA};

const BAM_ID: &str = "EGAF00000000001";
const FASTQ_ID: &str = "EGAF00000000002";
const EMPTY_ID: &str = "EGAF00000000003";

/// One BAM report, one FastQC archive and one identifier without QC.
fn mixed_archive() -> Archive {
    let archive = Archive::new();
    archive.report(
        BAM_ID,
        r#"{"Data":{"MappingQualityDistribution":[[5,100],[40,50]]}}"#,
    );
    archive.fastqc(FASTQ_ID, FASTQC_DATA);
    archive.execution_dir(EMPTY_ID);
    archive
}

fn options(pool: PoolKind, workers: usize) -> RunOptions {
    RunOptions {
        workers,
        batch_size: Some(2),
        pool,
        worker_program: Some(PathBuf::from(env!("CARGO_BIN_EXE_qcscan"))),
        ..RunOptions::default()
    }
}

/// Extract over the mixed archive; table body lines sorted, header first.
fn extract_table(archive: &Archive, options: &RunOptions) -> (Vec<String>, qcscan::RunReport) {
    let settings = AnalyzerSettings::new(AnalyzerKind::Extract, archive.root());
    let mut sink = MetricTableSink::new(Vec::new(), b',').unwrap();
    let report = run(
        &settings,
        id_stream(&[BAM_ID, FASTQ_ID, EMPTY_ID]),
        &mut sink,
        options,
        &ProcessGuard::new(),
    )
    .unwrap();

    let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    lines[1..].sort();
    (lines.into_iter().map(checked_mapq).collect(), report)
}

const MAPQ_PREFIX: &str = "EGAF00000000001,bamcram,mapq,";

/// Check the low-MAPQ percentage numerically and mask it, so table
/// comparisons do not depend on the last digit of the float.
fn checked_mapq(line: String) -> String {
    match line.strip_prefix(MAPQ_PREFIX) {
        Some(cell) => {
            let value: f64 = cell.parse().unwrap();
            assert!((value - 100.0 / 1.5).abs() < 1e-9, "mapq was {value}");
            format!("{MAPQ_PREFIX}<pct>")
        }
        None => line,
    }
}

const EXPECTED_TABLE: &str = "identifier,filetype,flag_key,value
EGAF00000000001,bamcram,mapq,<pct>
EGAF00000000002,fastq,duplicate_reads,12.5
EGAF00000000002,fastq,gc_content,41
EGAF00000000002,fastq,quality_reads,75
EGAF00000000003,__error__,no_qc,-1";

// ============================================
// Extraction Runs
// ============================================

#[test]
fn extract_inline_writes_rows_and_sentinel() {
    let archive = mixed_archive();
    let (lines, report) = extract_table(&archive, &options(PoolKind::Inline, 0));

    assert_eq!(lines.join("\n"), EXPECTED_TABLE);
    assert_eq!(report.summary.processed, 3);
    assert_eq!(report.summary.rows_written, 5);
    assert_eq!(report.summary.missing_qc, 1);
    assert_eq!(report.summary.sentinels.get(&SentinelKind::NoQc), Some(&1));
    assert!(!report.summary.interrupted);
}

#[test]
fn extract_with_threads_matches_inline() {
    let archive = mixed_archive();
    let (lines, report) = extract_table(&archive, &options(PoolKind::Threads, 3));

    insta::assert_snapshot!(lines.join("\n"), @r###"
    identifier,filetype,flag_key,value
    EGAF00000000001,bamcram,mapq,<pct>
    EGAF00000000002,fastq,duplicate_reads,12.5
    EGAF00000000002,fastq,gc_content,41
    EGAF00000000002,fastq,quality_reads,75
    EGAF00000000003,__error__,no_qc,-1
    "###);
    assert_eq!(report.stats.submitted, 3);
    assert_eq!(report.stats.batches, 2);
    assert!(report.stats.max_in_flight <= 2);
}

#[cfg(unix)]
#[test]
fn extract_with_worker_processes_matches_inline() {
    let archive = mixed_archive();
    let (lines, report) = extract_table(&archive, &options(PoolKind::Processes, 2));

    assert_eq!(lines.join("\n"), EXPECTED_TABLE);
    assert_eq!(report.summary.processed, 3);
}

#[test]
fn render_reports_missing_qc_and_filetypes() {
    let archive = mixed_archive();
    let (_, report) = extract_table(&archive, &options(PoolKind::Inline, 0));

    let rendered = report.render();
    assert!(rendered.contains("Finished checking 3 files."));
    assert!(rendered.contains("1 files (33.3%) have a missing QC report."));
    assert!(rendered.contains("Wrote 5 rows."));
    assert!(rendered.contains("  bamcram: 1"));
    assert!(rendered.contains("  fastq: 1"));
    assert!(rendered.contains("  no_qc: 1"));
}

// ============================================
// Classification Runs
// ============================================

#[test]
fn classify_splits_flagged_and_silent_identifiers() {
    let archive = Archive::new();
    archive.report(BAM_ID, r#"{"InsertSize": 300}"#);
    archive.log(
        FASTQ_ID,
        "align.e4711",
        "[M::mem_process_seqs] Processed 10000 reads\n[E::bwa_idx_load] fail to locate the index files\n",
    );
    archive.log(EMPTY_ID, "align.e4712", "all good\n");

    let settings = AnalyzerSettings::new(AnalyzerKind::Classify, archive.root());
    let mut sink = ExcerptSink::new(Vec::new(), Vec::new());
    let report = run(
        &settings,
        id_stream(&[BAM_ID, FASTQ_ID, EMPTY_ID]),
        &mut sink,
        &options(PoolKind::Threads, 2),
        &ProcessGuard::new(),
    )
    .unwrap();

    let (excerpts, missing) = sink.into_inner().unwrap();
    assert_eq!(
        String::from_utf8(excerpts).unwrap(),
        ">> EGAF00000000002\n-- align.e4711 (1 match)\n[E::bwa_idx_load] fail to locate the index files\n\n"
    );
    assert_eq!(String::from_utf8(missing).unwrap(), "EGAF00000000003\n");

    let summary = &report.summary;
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.qc_present, 1);
    assert_eq!(summary.flagged, 1);
    assert_eq!(summary.missing_no_error, 1);
    assert_eq!(summary.total_matches, 1);
    assert_eq!(summary.log_matches.get("align.e"), Some(&1));
}

#[test]
fn interrupted_run_stops_before_first_batch() {
    let archive = mixed_archive();
    let guard = ProcessGuard::new();
    guard
        .interrupt_flag()
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let settings = AnalyzerSettings::new(AnalyzerKind::Extract, archive.root());
    let mut sink = MetricTableSink::new(Vec::new(), b',').unwrap();
    let report = run(
        &settings,
        id_stream(&[BAM_ID, FASTQ_ID, EMPTY_ID]),
        &mut sink,
        &options(PoolKind::Threads, 2),
        &guard,
    )
    .unwrap();

    assert!(report.summary.interrupted);
    assert_eq!(report.summary.processed, 0);
    let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    assert_eq!(text, "identifier,filetype,flag_key,value\n");
}

#[test]
fn empty_input_produces_header_only() {
    let archive = Archive::new();
    let settings = AnalyzerSettings::new(AnalyzerKind::Extract, archive.root());
    let mut sink = MetricTableSink::new(Vec::new(), b'\t').unwrap();
    let report = run(
        &settings,
        id_stream(&[]),
        &mut sink,
        &options(PoolKind::Auto, 4),
        &ProcessGuard::new(),
    )
    .unwrap();

    assert_eq!(report.summary.processed, 0);
    assert!(report.render().contains("No files were checked."));
    let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    assert_eq!(text, "identifier\tfiletype\tflag_key\tvalue\n");
}
