//! Extract command handler

use anyhow::{Context, Result};
use std::path::Path;

use qcscan::cli::{InputArgs, RunArgs};
use qcscan::config::{parse_delimiter, Config};
use qcscan::output::MetricTableSink;
use qcscan::{AnalyzerKind, AnalyzerSettings};

/// Extract QC metrics into a delimited table.
#[cfg(not(tarpaulin_include))]
pub fn handle(
    config_path: Option<&Path>,
    input: &InputArgs,
    output: &Path,
    include_crypt: bool,
    delimiter: Option<&str>,
    run: &RunArgs,
) -> Result<()> {
    let config = super::load_config(config_path)?;
    let root = super::archive_root(&config, run)?;

    let mut settings = AnalyzerSettings::new(AnalyzerKind::Extract, root);
    settings.log_dir = config.archive.log_dir.clone();
    settings.include_crypt = include_crypt || config.extract.include_crypt;

    let delimiter = effective_delimiter(&config, delimiter)?;
    let options = super::run_options(&config, run)?;
    let ids = super::identifiers(input)?;

    let mut sink = MetricTableSink::create(output, delimiter).context("Failed to create metric table")?;

    super::execute(&settings, ids, &mut sink, &options)
}

/// `--delimiter` if given, else `[extract] delimiter`.
pub fn effective_delimiter(config: &Config, flag: Option<&str>) -> Result<u8> {
    let delimiter = match flag {
        Some(raw) => parse_delimiter(raw),
        None => config.extract.delimiter_byte(),
    };
    delimiter.context("Invalid delimiter")
}
