//! Unit tests for metric extraction against archive fixtures

use qcscan::analyzer::{AnalysisResult, Analyzer, FileType, MetricExtractor, SentinelKind};
use qcscan::archive::{ArchiveLayout, Identifier};

use crate::helpers::{Archive, FASTQC_DATA};

const ID: &str = "EGAF00001234567";

fn extract(archive: &Archive, extractor: &MetricExtractor) -> AnalysisResult {
    let set = ArchiveLayout::new(archive.root()).resolve(&Identifier::new(ID));
    extractor.analyze(&set).unwrap()
}

fn rows(result: &AnalysisResult) -> (FileType, Vec<(String, f64)>) {
    match result {
        AnalysisResult::MetricRows { filetype, rows } => (
            *filetype,
            rows.iter().map(|r| (r.key.clone(), r.value)).collect(),
        ),
        other => panic!("expected metric rows, got {:?}", other),
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn full_bamcram_report() {
    let archive = Archive::new();
    archive.report(
        ID,
        r#"{
            "InsertSize": 312.5,
            "Data": {
                "MappedReads": [0.95],
                "MappingQualityDistribution": [[10, 5], [40, 15]],
                "Duplicates": [0.08]
            }
        }"#,
    );

    let (filetype, rows) = rows(&extract(&archive, &MetricExtractor::default()));
    assert_eq!(filetype, FileType::Bamcram);

    let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["insert_size", "unaligned", "mapq", "duplicate_reads"]);
    assert_close(rows[0].1, 312.5);
    assert_close(rows[1].1, 5.0);
    assert_close(rows[2].1, 25.0);
    assert_close(rows[3].1, 8.0);
}

#[test]
fn gc_content_from_encrypted_stats_comes_last() {
    let archive = Archive::new();
    archive
        .report(ID, r#"{"InsertSize": 300}"#)
        .stats(ID, "# samtools stats\nGCF\t40\t1\nGCF\t60\t1\nGCL\t50\t2\n", "s3cret");

    let (_, rows) = rows(&extract(&archive, &MetricExtractor::new(true)));
    let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["insert_size", "gc_content"]);
    assert_close(rows[1].1, 50.0);
}

#[test]
fn vcf_report_yields_vcf_rows() {
    let archive = Archive::new();
    archive.report(
        ID,
        r#"{"VCFVersion": "4.2", "AvgQuality": 812.4, "Data": {"TsTvRatio": 2.07}}"#,
    );

    let (filetype, rows) = rows(&extract(&archive, &MetricExtractor::new(true)));
    assert_eq!(filetype, FileType::Vcf);
    let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["tstv_ratio", "avg_qual"]);
    assert_close(rows[0].1, 2.07);
    assert_close(rows[1].1, 812.4);
}

#[test]
fn fastqc_archive_yields_three_rows() {
    let archive = Archive::new();
    archive.fastqc(ID, FASTQC_DATA);

    let (filetype, rows) = rows(&extract(&archive, &MetricExtractor::default()));
    assert_eq!(filetype, FileType::Fastq);
    let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["gc_content", "duplicate_reads", "quality_reads"]);
    assert_close(rows[0].1, 41.0);
    assert_close(rows[1].1, 12.5);
    assert_close(rows[2].1, 75.0);
}

#[test]
fn json_report_wins_over_fastqc_archive() {
    let archive = Archive::new();
    archive
        .report(ID, r#"{"InsertSize": 280}"#)
        .fastqc(ID, FASTQC_DATA);

    let (filetype, _) = rows(&extract(&archive, &MetricExtractor::default()));
    assert_eq!(filetype, FileType::Bamcram);
}

#[test]
fn report_without_any_metric_yields_empty_rows() {
    let archive = Archive::new();
    archive.report(ID, r#"{"Data": {}}"#);

    let (filetype, rows) = rows(&extract(&archive, &MetricExtractor::default()));
    assert_eq!(filetype, FileType::Bamcram);
    assert!(rows.is_empty());
}

#[test]
fn nothing_present_is_no_qc() {
    let archive = Archive::new();
    archive.execution_dir(ID);
    assert_eq!(
        extract(&archive, &MetricExtractor::default()),
        AnalysisResult::sentinel(SentinelKind::NoQc)
    );
}
