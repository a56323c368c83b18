//! CLI tests against the qcscan binary

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::helpers::{Archive, FASTQC_DATA};

/// `qcscan` with an isolated home directory and logging left at its default.
fn qcscan(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_qcscan"));
    cmd.env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn sorted_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().collect();
    lines[1..].sort();
    lines
}

// ============================================================================
// Extract
// ============================================================================

#[cfg(unix)]
#[test]
fn extract_with_process_pool_writes_table() {
    let home = TempDir::new().unwrap();
    let archive = Archive::new();
    archive.report(
        "EGAF00000000001",
        r#"{"InsertSize": 250.5, "Data": {"MappedReads": [0.75]}}"#,
    );
    archive.fastqc("EGAF00000000002", FASTQC_DATA);
    let ids = archive.id_list(&["EGAF00000000001", "EGAF00000000002", "EGAF00000000003"]);
    let output = home.path().join("metrics.csv");

    qcscan(&home)
        .args(["extract", "--pool", "processes", "-w", "2", "-q", "--root"])
        .arg(archive.root())
        .arg("--file")
        .arg(&ids)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Finished checking 3 files."))
        .stdout(predicate::str::contains("Wrote 6 rows."));

    let table = fs::read_to_string(&output).unwrap();
    assert_eq!(
        sorted_lines(&table),
        vec![
            "identifier,filetype,flag_key,value",
            "EGAF00000000001,bamcram,insert_size,250.5",
            "EGAF00000000001,bamcram,unaligned,25",
            "EGAF00000000002,fastq,duplicate_reads,12.5",
            "EGAF00000000002,fastq,gc_content,41",
            "EGAF00000000002,fastq,quality_reads,75",
            "EGAF00000000003,__error__,no_qc,-1",
        ]
    );
}

#[test]
fn extract_single_id_with_tab_delimiter() {
    let home = TempDir::new().unwrap();
    let archive = Archive::new();
    archive.report(
        "EGAF00000000001",
        r#"{"VCFVersion": "4.2", "AvgQuality": 40.5, "Data": {"TsTvRatio": 2}}"#,
    );
    let output = home.path().join("metrics.tsv");

    qcscan(&home)
        .args(["extract", "--id", "EGAF00000000001", "--delimiter", "\\t", "--root"])
        .arg(archive.root())
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "identifier\tfiletype\tflag_key\tvalue\n\
         EGAF00000000001\tvcf\ttstv_ratio\t2\n\
         EGAF00000000001\tvcf\tavg_qual\t40.5\n"
    );
}

#[test]
fn extract_reads_archive_root_from_config() {
    let home = TempDir::new().unwrap();
    let archive = Archive::new();
    archive.execution_dir("EGAF00000000001");
    let config = home.path().join("qcscan.toml");
    fs::write(
        &config,
        format!(
            "[archive]\nroot = {:?}\n\n[extract]\ndelimiter = \";\"\n",
            archive.root().display().to_string()
        ),
    )
    .unwrap();
    let output = home.path().join("metrics.csv");

    qcscan(&home)
        .arg("--config")
        .arg(&config)
        .args(["extract", "--id", "EGAF00000000001", "-o"])
        .arg(&output)
        .assert()
        .success();

    let table = fs::read_to_string(&output).unwrap();
    assert!(table.ends_with("EGAF00000000001;__error__;no_qc;-1\n"));
}

#[test]
fn extract_without_root_fails() {
    let home = TempDir::new().unwrap();
    qcscan(&home)
        .args(["extract", "--id", "EGAF00000000001", "-o"])
        .arg(home.path().join("out.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No archive root"));
}

#[test]
fn extract_rejects_bad_delimiter() {
    let home = TempDir::new().unwrap();
    let archive = Archive::new();
    qcscan(&home)
        .args(["extract", "--id", "EGAF00000000001", "--delimiter", "::", "--root"])
        .arg(archive.root())
        .arg("-o")
        .arg(home.path().join("out.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid delimiter"));
}

#[test]
fn id_and_file_are_mutually_exclusive() {
    let home = TempDir::new().unwrap();
    qcscan(&home)
        .args(["extract", "--id", "X", "--file", "ids.txt", "-o", "out.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// Classify
// ============================================================================

#[test]
fn classify_writes_excerpts_and_missing_list() {
    let home = TempDir::new().unwrap();
    let archive = Archive::new();
    archive
        .report("EGAF00000000001", r#"{"InsertSize": 300}"#)
        .log(
            "EGAF00000000002",
            "sort.e77",
            "java.lang.OutOfMemoryError: Java heap space\n",
        )
        .log("EGAF00000000003", "sort.e78", "done\n");
    let ids = archive.id_list(&["EGAF00000000001", "EGAF00000000002", "EGAF00000000003"]);
    let output = home.path().join("errors.txt");

    qcscan(&home)
        .args(["classify", "-q", "--pool", "threads", "--root"])
        .arg(archive.root())
        .arg("--file")
        .arg(&ids)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Finished checking 3 files."))
        .stdout(predicate::str::contains("2 files (66.7%) have a missing QC report."))
        .stdout(predicate::str::contains("  sort.e: 1"))
        .stdout(predicate::str::contains("Total errors: 1"));

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        ">> EGAF00000000002\n-- sort.e77 (1 match)\njava.lang.OutOfMemoryError: Java heap space\n\n"
    );
    assert_eq!(
        fs::read_to_string(home.path().join("errors.no_error.txt")).unwrap(),
        "EGAF00000000003\n"
    );
}

#[test]
fn classify_reads_identifiers_from_stdin() {
    let home = TempDir::new().unwrap();
    let archive = Archive::new();
    archive.log("EGAF00000000009", "align.e1", "Segmentation fault\n");
    let output = home.path().join("errors.txt");
    let missing = home.path().join("silent.txt");

    qcscan(&home)
        .args(["classify", "--file", "-", "--root"])
        .arg(archive.root())
        .arg("-o")
        .arg(&output)
        .arg("--missing-output")
        .arg(&missing)
        .write_stdin("EGAF00000000009\n\nbad id\n")
        .assert()
        .success();

    let excerpts = fs::read_to_string(&output).unwrap();
    assert!(excerpts.starts_with(">> EGAF00000000009\n"));
    // a malformed identifier resolves to nothing and has no logs
    assert_eq!(fs::read_to_string(&missing).unwrap(), "bad id\n");
}

// ============================================================================
// Meta Commands
// ============================================================================

#[test]
fn version_flag() {
    let home = TempDir::new().unwrap();
    qcscan(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("qcscan "));
}

#[test]
fn config_show_renders_loaded_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("config.toml");
    fs::write(&config, "[pipeline]\nworkers = 7\npool = \"threads\"\n").unwrap();

    qcscan(&home)
        .args(["config", "show", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("workers = 7"))
        .stdout(predicate::str::contains("pool = \"threads\""))
        .stdout(predicate::str::contains("[classify]"));
}

#[test]
fn config_show_rejects_invalid_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("config.toml");
    fs::write(&config, "[pipeline]\nmax_workers = 0\n").unwrap();

    qcscan(&home)
        .args(["config", "show", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_workers must be > 0"));
}

#[test]
fn bash_completions() {
    let home = TempDir::new().unwrap();
    qcscan(&home)
        .args(["completions", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_qcscan()"));
}

#[test]
fn worker_command_is_hidden_from_help() {
    let home = TempDir::new().unwrap();
    qcscan(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("worker").not());
}
