//! Archive layout: identifiers and the artifacts stored for them.
//!
//! Every identifier maps deterministically to an execution directory:
//!
//! ```text
//! <root>/<id[0..9]>/<id[9..12]>/<id[12..15]>/execution/
//!     <id>_report.json.gz      compressed JSON QC report (BAM/CRAM or VCF)
//!     stdin_fastqc.zip         FastQC archive (FASTQ)
//!     stats.txt.openssl.gz     encrypted samtools statistics (optional)
//!     key                      passphrase for the statistics file (optional)
//!     logs/                    error logs of the QC jobs (*.e<job>, *.o<job>)
//! ```
//!
//! Resolution only checks for existence. It never reads artifact content and
//! never fails: an absent directory simply yields an empty [`ArtifactSet`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Length of the identifier prefix consumed by the partitioning scheme.
pub const PARTITIONED_LEN: usize = 15;

/// Default name of the error-log directory inside `execution/`.
pub const DEFAULT_LOG_DIR: &str = "logs";

const JSON_REPORT_SUFFIX: &str = "_report.json.gz";
const FASTQC_ARCHIVE: &str = "stdin_fastqc.zip";
const ENCRYPTED_STATS: &str = "stats.txt.openssl.gz";
const PASSPHRASE_FILE: &str = "key";

/// Canonical identifier of one sequencing file's QC bundle (e.g. `EGAF00005432457`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Create an identifier from raw input, trimming surrounding whitespace.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is long enough and plain ASCII, so it can be partitioned.
    pub fn is_canonical(&self) -> bool {
        self.0.len() >= PARTITIONED_LEN && self.0.chars().all(|c| c.is_ascii_alphanumeric())
    }

    /// The three directory partitions, or `None` for identifiers that cannot be split.
    pub fn partitions(&self) -> Option<(&str, &str, &str)> {
        if !self.0.is_ascii() {
            return None;
        }
        Some((self.0.get(0..9)?, self.0.get(9..12)?, self.0.get(12..15)?))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Artifacts found for one identifier.
///
/// Built once by [`ArchiveLayout::resolve`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    id: Identifier,
    execution_dir: Option<PathBuf>,
    json_report: Option<PathBuf>,
    fastqc_archive: Option<PathBuf>,
    encrypted_stats: Option<PathBuf>,
    passphrase: Option<PathBuf>,
    log_dir: Option<PathBuf>,
}

impl ArtifactSet {
    /// An artifact set with nothing present.
    pub fn empty(id: Identifier) -> Self {
        Self {
            id,
            execution_dir: None,
            json_report: None,
            fastqc_archive: None,
            encrypted_stats: None,
            passphrase: None,
            log_dir: None,
        }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// Execution directory, when it exists.
    pub fn execution_dir(&self) -> Option<&Path> {
        self.execution_dir.as_deref()
    }

    pub fn json_report(&self) -> Option<&Path> {
        self.json_report.as_deref()
    }

    pub fn fastqc_archive(&self) -> Option<&Path> {
        self.fastqc_archive.as_deref()
    }

    pub fn encrypted_stats(&self) -> Option<&Path> {
        self.encrypted_stats.as_deref()
    }

    pub fn passphrase(&self) -> Option<&Path> {
        self.passphrase.as_deref()
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    /// Whether a primary QC artifact (JSON report or FastQC archive) exists.
    ///
    /// This alone decides "QC present" vs "QC missing"; the encrypted statistics
    /// file never counts as a QC artifact.
    pub fn has_qc(&self) -> bool {
        self.json_report.is_some() || self.fastqc_archive.is_some()
    }

    /// Both the encrypted statistics and their passphrase are present.
    pub fn has_encrypted_stats(&self) -> bool {
        self.encrypted_stats.is_some() && self.passphrase.is_some()
    }
}

/// Maps identifiers to artifact paths below an explicit archive root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    root: PathBuf,
    log_dir: String,
}

impl ArchiveLayout {
    /// Create a layout rooted at `root` with the default log directory name.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            log_dir: DEFAULT_LOG_DIR.to_string(),
        }
    }

    /// Override the error-log directory name.
    pub fn with_log_dir(mut self, log_dir: impl Into<String>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn log_dir_name(&self) -> &str {
        &self.log_dir
    }

    /// Execution directory for an identifier (whether or not it exists).
    pub fn execution_dir(&self, id: &Identifier) -> Option<PathBuf> {
        let (prefix, middle, suffix) = id.partitions()?;
        Some(
            self.root
                .join(prefix)
                .join(middle)
                .join(suffix)
                .join("execution"),
        )
    }

    /// Resolve the artifacts present for `id`.
    pub fn resolve(&self, id: &Identifier) -> ArtifactSet {
        let Some(dir) = self.execution_dir(id).filter(|d| d.is_dir()) else {
            return ArtifactSet::empty(id.clone());
        };

        let file = |name: &str| Some(dir.join(name)).filter(|p| p.is_file());

        ArtifactSet {
            id: id.clone(),
            json_report: file(&format!("{}{}", id, JSON_REPORT_SUFFIX)),
            fastqc_archive: file(FASTQC_ARCHIVE),
            encrypted_stats: file(ENCRYPTED_STATS),
            passphrase: file(PASSPHRASE_FILE),
            log_dir: Some(dir.join(&self.log_dir)).filter(|p| p.is_dir()),
            execution_dir: Some(dir),
        }
    }
}
