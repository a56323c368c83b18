//! Classify command handler

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use qcscan::cli::{InputArgs, RunArgs};
use qcscan::output::ExcerptSink;
use qcscan::{AnalyzerKind, AnalyzerSettings};

/// Classify missing QC reports and write excerpt and identifier files.
#[cfg(not(tarpaulin_include))]
pub fn handle(
    config_path: Option<&Path>,
    input: &InputArgs,
    output: &Path,
    missing_output: Option<&Path>,
    run: &RunArgs,
) -> Result<()> {
    let config = super::load_config(config_path)?;
    let root = super::archive_root(&config, run)?;

    let mut settings = AnalyzerSettings::new(AnalyzerKind::Classify, root);
    settings.log_dir = config.archive.log_dir.clone();
    settings.extra_patterns = config.classify.extra_patterns.clone();
    settings.max_excerpt_lines = config.classify.max_excerpt_lines;

    let options = super::run_options(&config, run)?;
    let ids = super::identifiers(input)?;

    let missing = missing_output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_missing_output(output));
    let mut sink = ExcerptSink::create(output, &missing).context("Failed to create output files")?;

    super::execute(&settings, ids, &mut sink, &options)
}

/// `<dir>/<stem>.no_error.txt` next to the excerpt file.
pub fn default_missing_output(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{}.no_error.txt", stem))
}
