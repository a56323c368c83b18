//! Error classifier: explains missing QC reports from job logs.
//!
//! For identifiers without a QC artifact, every `*.e<job>` / `*.o<job>` file in
//! the log directory is scanned line by line and matching lines are collected
//! into one [`LogExcerpt`] per log file.

use super::error::AnalysisError;
use super::patterns::ErrorPatterns;
use super::types::{AnalysisResult, LogExcerpt};
use super::Analyzer;
use crate::archive::ArtifactSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default number of matched lines kept per log file.
pub const DEFAULT_MAX_EXCERPT_LINES: usize = 200;

/// Analyzer that classifies missing QC by scanning error logs.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    patterns: ErrorPatterns,
    max_excerpt_lines: usize,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(ErrorPatterns::default(), DEFAULT_MAX_EXCERPT_LINES)
    }
}

impl ErrorClassifier {
    pub fn new(patterns: ErrorPatterns, max_excerpt_lines: usize) -> Self {
        Self {
            patterns,
            max_excerpt_lines,
        }
    }

    /// Scan one log file, returning `None` when nothing matched.
    pub fn scan_log(&self, path: &Path) -> std::io::Result<Option<LogExcerpt>> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut buf = Vec::new();
        let mut lines = Vec::new();
        let mut total_matches = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            if self.patterns.is_match(line) {
                total_matches += 1;
                if lines.len() < self.max_excerpt_lines {
                    lines.push(line.to_string());
                }
            }
        }

        if total_matches == 0 {
            return Ok(None);
        }

        let log_file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Some(LogExcerpt {
            log_file,
            lines,
            total_matches,
        }))
    }
}

impl Analyzer for ErrorClassifier {
    fn name(&self) -> &'static str {
        "classify"
    }

    fn analyze(&self, artifacts: &ArtifactSet) -> Result<AnalysisResult, AnalysisError> {
        if artifacts.has_qc() {
            return Ok(AnalysisResult::QcPresent);
        }
        let Some(log_dir) = artifacts.log_dir() else {
            debug!(id = %artifacts.id(), "no log directory");
            return Ok(AnalysisResult::MissingNoError);
        };

        let mut excerpts = Vec::new();
        for path in list_logs(log_dir)? {
            match self.scan_log(&path) {
                Ok(Some(excerpt)) => excerpts.push(excerpt),
                Ok(None) => {}
                Err(e) => {
                    warn!(id = %artifacts.id(), path = %path.display(), error = %e, "skipping unreadable log");
                }
            }
        }

        if excerpts.is_empty() {
            Ok(AnalysisResult::MissingNoError)
        } else {
            Ok(AnalysisResult::ErrorExcerpt { excerpts })
        }
    }
}

/// Log files of a directory, sorted by file name.
pub fn list_logs(dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    let entries = fs::read_dir(dir).map_err(|e| AnalysisError::io(dir, e))?;

    let mut logs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_log_file(path))
        .collect();
    logs.sort();
    Ok(logs)
}

/// Whether the file's extension is `e` or `o`, optionally followed by a job number.
pub fn is_log_file(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let mut chars = ext.chars();
    matches!(chars.next(), Some('e') | Some('o')) && chars.all(|c| c.is_ascii_digit())
}

/// Summary key of a log file: its name without the trailing job number.
///
/// `align.e81234` and `align.e99` both count towards `align.e`.
pub fn log_key(file_name: &str) -> &str {
    file_name.trim_end_matches(|c: char| c.is_ascii_digit())
}
