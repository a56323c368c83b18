//! Fault injection: damaged artifacts never escape the worker boundary

use qcscan::analyzer::{AnalysisResult, AnalyzerKind, AnalyzerSettings, FileType, SentinelKind};
use qcscan::archive::Identifier;
use qcscan::pipeline::executor::run_task;

use crate::helpers::{gzip, Archive};

const ID: &str = "EGAF00001234567";

fn extract_task(archive: &Archive, include_crypt: bool) -> AnalysisResult {
    let mut settings = AnalyzerSettings::new(AnalyzerKind::Extract, archive.root());
    settings.include_crypt = include_crypt;
    let analyzer = settings.create().unwrap();
    run_task(analyzer.as_ref(), &settings.layout(), &Identifier::new(ID))
}

fn worker_exception() -> AnalysisResult {
    AnalysisResult::sentinel(SentinelKind::WorkerException)
}

#[test]
fn report_that_is_not_gzip() {
    let archive = Archive::new();
    archive.raw(ID, "EGAF00001234567_report.json.gz", b"{\"InsertSize\": 1}");
    assert_eq!(extract_task(&archive, false), worker_exception());
}

#[test]
fn report_with_corrupt_json() {
    let archive = Archive::new();
    archive.raw(
        ID,
        "EGAF00001234567_report.json.gz",
        &gzip(b"{\"InsertSize\": 31"),
    );
    assert_eq!(extract_task(&archive, false), worker_exception());
}

#[test]
fn report_that_is_not_an_object_has_no_metrics() {
    let archive = Archive::new();
    archive.raw(ID, "EGAF00001234567_report.json.gz", &gzip(b"[1, 2, 3]"));
    assert_eq!(
        extract_task(&archive, false),
        AnalysisResult::MetricRows {
            filetype: FileType::Bamcram,
            rows: vec![],
        }
    );
}

#[test]
fn truncated_fastqc_archive() {
    let archive = Archive::new();
    archive.raw(ID, "stdin_fastqc.zip", b"PK\x03\x04 truncated");
    assert_eq!(extract_task(&archive, false), worker_exception());
}

#[test]
fn fastqc_archive_without_data_entry() {
    let archive = Archive::new();
    let path = archive.execution_dir(ID).join("stdin_fastqc.zip");
    let mut zip = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
    zip.start_file("stdin_fastqc/summary.txt", zip::write::SimpleFileOptions::default())
        .unwrap();
    std::io::Write::write_all(&mut zip, b"PASS\tBasic Statistics\n").unwrap();
    zip.finish().unwrap();

    assert_eq!(extract_task(&archive, false), worker_exception());
}

#[test]
fn non_text_stats_only_omit_gc_content() {
    let archive = Archive::new();
    archive.report(ID, r#"{"InsertSize": 300}"#);
    archive.raw(ID, "stats.txt.openssl.gz", &gzip(b"@@@ not base64 @@@"));
    archive.raw(ID, "key", b"pw\n");

    let AnalysisResult::MetricRows { rows, .. } = extract_task(&archive, true) else {
        panic!("expected metric rows");
    };
    let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["insert_size"]);
}

#[test]
fn stats_without_key_file_only_omit_gc_content() {
    let archive = Archive::new();
    archive
        .report(ID, r#"{"InsertSize": 300}"#)
        .stats(ID, "GCF\t40\t1\n", "pw");
    std::fs::remove_file(archive.execution_dir(ID).join("key")).unwrap();

    let AnalysisResult::MetricRows { rows, .. } = extract_task(&archive, true) else {
        panic!("expected metric rows");
    };
    assert_eq!(rows.len(), 1);
}

#[test]
fn directory_named_like_a_log_is_skipped() {
    let archive = Archive::new();
    std::fs::create_dir_all(archive.execution_dir(ID).join("logs").join("align.e1")).unwrap();
    archive.log(ID, "align.e2", "Segmentation fault (core dumped)\n");

    let settings = AnalyzerSettings::new(AnalyzerKind::Classify, archive.root());
    let analyzer = settings.create().unwrap();
    let result = run_task(analyzer.as_ref(), &settings.layout(), &Identifier::new(ID));
    assert!(matches!(result, AnalysisResult::ErrorExcerpt { .. }));
}
