//! Unit tests for the error classifier against archive fixtures

use qcscan::analyzer::{AnalysisResult, Analyzer, ErrorClassifier, ErrorPatterns};
use qcscan::archive::{ArchiveLayout, Identifier};

use crate::helpers::Archive;

const ID: &str = "EGAF00001234567";

fn classify(archive: &Archive, classifier: &ErrorClassifier) -> AnalysisResult {
    let set = ArchiveLayout::new(archive.root()).resolve(&Identifier::new(ID));
    classifier.analyze(&set).unwrap()
}

#[test]
fn qc_present_skips_log_scan() {
    let archive = Archive::new();
    archive
        .report(ID, "{}")
        .log(ID, "align.e1", "Segmentation fault\n");
    assert_eq!(
        classify(&archive, &ErrorClassifier::default()),
        AnalysisResult::QcPresent
    );
}

#[test]
fn matched_lines_are_grouped_per_log_in_name_order() {
    let archive = Archive::new();
    archive
        .log(
            ID,
            "fastqc.o7",
            "Started analysis of stdin\nApprox 5% complete - analysing...\nException in thread \"main\" java.lang.OutOfMemoryError\n",
        )
        .log(
            ID,
            "align.e81234",
            "[M::bwa_idx_load_from_disk] read 0 ALT contigs\n[E::bwa_idx_load_from_disk] fail to locate the index files\nSegmentation fault (core dumped)\n",
        )
        .log(ID, "notes.txt", "Segmentation fault\n");

    let AnalysisResult::ErrorExcerpt { excerpts } = classify(&archive, &ErrorClassifier::default())
    else {
        panic!("expected an error excerpt");
    };

    let names: Vec<&str> = excerpts.iter().map(|e| e.log_file.as_str()).collect();
    assert_eq!(names, vec!["align.e81234", "fastqc.o7"]);
    assert_eq!(
        excerpts[0].lines,
        vec![
            "[E::bwa_idx_load_from_disk] fail to locate the index files",
            "Segmentation fault (core dumped)",
        ]
    );
    assert_eq!(excerpts[1].total_matches, 1);
}

#[test]
fn clean_logs_mean_missing_without_error() {
    let archive = Archive::new();
    archive.log(ID, "fastqc.o1", "Approx 5% complete - analysing...\nAnalysis complete\n");
    assert_eq!(
        classify(&archive, &ErrorClassifier::default()),
        AnalysisResult::MissingNoError
    );
}

#[test]
fn no_log_directory_means_missing_without_error() {
    let archive = Archive::new();
    archive.execution_dir(ID);
    assert_eq!(
        classify(&archive, &ErrorClassifier::default()),
        AnalysisResult::MissingNoError
    );
}

#[test]
fn excerpt_lines_are_capped_but_counted() {
    let archive = Archive::new();
    archive.log(ID, "run.e3", &"Killed by signal 9\n".repeat(10));

    let classifier = ErrorClassifier::new(ErrorPatterns::default(), 3);
    let AnalysisResult::ErrorExcerpt { excerpts } = classify(&archive, &classifier) else {
        panic!("expected an error excerpt");
    };
    assert_eq!(excerpts[0].lines.len(), 3);
    assert_eq!(excerpts[0].total_matches, 10);
    assert_eq!(excerpts[0].omitted(), 7);
}

#[test]
fn extra_patterns_extend_the_builtin_set() {
    let archive = Archive::new();
    archive.log(ID, "site.e5", "scratch volume offline\n");

    let plain = classify(&archive, &ErrorClassifier::default());
    assert_eq!(plain, AnalysisResult::MissingNoError);

    let patterns = ErrorPatterns::with_extra(&["volume offline"]).unwrap();
    let extended = classify(&archive, &ErrorClassifier::new(patterns, 200));
    assert!(matches!(extended, AnalysisResult::ErrorExcerpt { .. }));
}

#[test]
fn invalid_utf8_lines_are_still_scanned() {
    let archive = Archive::new();
    let dir = archive.execution_dir(ID).join("logs");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("align.e2"), b"\xff\xfe garbage\r\nNo space left on device\r\n").unwrap();

    let AnalysisResult::ErrorExcerpt { excerpts } = classify(&archive, &ErrorClassifier::default())
    else {
        panic!("expected an error excerpt");
    };
    assert_eq!(excerpts[0].lines, vec!["No space left on device"]);
}
