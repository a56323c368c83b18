//! Unit tests for identifier resolution

use qcscan::archive::{ArchiveLayout, Identifier};

use crate::helpers::Archive;

const ID: &str = "EGAF00005432457";

#[test]
fn resolve_finds_every_artifact_kind() {
    let archive = Archive::new();
    archive
        .report(ID, "{}")
        .fastqc(ID, "")
        .stats(ID, "GCF\t40\t1\n", "pw")
        .log(ID, "align.e1", "");

    let set = ArchiveLayout::new(archive.root()).resolve(&Identifier::new(ID));
    let exec = archive.execution_dir(ID);

    assert_eq!(set.execution_dir(), Some(exec.as_path()));
    assert_eq!(
        set.json_report(),
        Some(exec.join("EGAF00005432457_report.json.gz").as_path())
    );
    assert_eq!(set.fastqc_archive(), Some(exec.join("stdin_fastqc.zip").as_path()));
    assert_eq!(set.encrypted_stats(), Some(exec.join("stats.txt.openssl.gz").as_path()));
    assert_eq!(set.passphrase(), Some(exec.join("key").as_path()));
    assert_eq!(set.log_dir(), Some(exec.join("logs").as_path()));
    assert!(set.has_qc());
    assert!(set.has_encrypted_stats());
}

#[test]
fn resolve_is_pure() {
    let archive = Archive::new();
    archive.fastqc(ID, "");
    let layout = ArchiveLayout::new(archive.root());

    for raw in [ID, "EGAF00000000001", "short", "", "EGAFé0005432457x"] {
        let id = Identifier::new(raw);
        assert_eq!(layout.resolve(&id), layout.resolve(&id), "differs for {:?}", raw);
    }
}

#[test]
fn absent_directory_resolves_to_empty_set() {
    let archive = Archive::new();
    let set = ArchiveLayout::new(archive.root()).resolve(&Identifier::new(ID));
    assert!(set.execution_dir().is_none());
    assert!(!set.has_qc());
    assert!(set.log_dir().is_none());
}

#[test]
fn custom_log_dir_name() {
    let archive = Archive::new();
    let logs = archive.execution_dir(ID).join("joblogs");
    std::fs::create_dir_all(&logs).unwrap();

    let layout = ArchiveLayout::new(archive.root()).with_log_dir("joblogs");
    let set = layout.resolve(&Identifier::new(ID));
    assert_eq!(set.log_dir(), Some(logs.as_path()));
}

#[test]
fn directory_named_like_an_artifact_is_not_an_artifact() {
    let archive = Archive::new();
    std::fs::create_dir_all(archive.execution_dir(ID).join("stdin_fastqc.zip")).unwrap();

    let set = ArchiveLayout::new(archive.root()).resolve(&Identifier::new(ID));
    assert!(set.fastqc_archive().is_none());
}
