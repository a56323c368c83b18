//! Command handlers for the qcscan CLI.
//!
//! Each submodule handles a specific CLI command or command group.
//! The main dispatch logic remains in main.rs.

pub mod classify;
pub mod completions;
pub mod config;
pub mod extract;
pub mod worker;

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use qcscan::cli::{InputArgs, RunArgs};
use qcscan::output::ResultSink;
use qcscan::pipeline::read_identifiers;
use qcscan::{AnalyzerSettings, Config, Identifier, ProcessGuard, RunOptions};

/// Boxed identifier stream, from `--id` or `--file`.
pub type Identifiers = Box<dyn Iterator<Item = io::Result<Identifier>>>;

/// Load the configuration named by `--config`, or the default file.
///
/// An explicit path must exist; the default location may be absent.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            Config::load_from(path)
        }
        None => Config::load(),
    }
}

/// Archive root from `--root`, falling back to `[archive] root`.
pub fn archive_root(config: &Config, run: &RunArgs) -> Result<PathBuf> {
    let root = match run.root.clone().or_else(|| config.archive_root()) {
        Some(root) => root,
        None => bail!("No archive root: pass --root or set [archive] root in the config file"),
    };
    if !root.is_dir() {
        bail!("Archive root is not a directory: {}", root.display());
    }
    Ok(root)
}

/// Open the identifier stream for a run.
pub fn identifiers(input: &InputArgs) -> Result<Identifiers> {
    if let Some(id) = &input.id {
        return Ok(Box::new(std::iter::once(Ok(Identifier::new(id)))));
    }
    match input.file.as_deref() {
        Some(path) if path == Path::new("-") => Ok(Box::new(read_identifiers(io::stdin().lock()))),
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open identifier list: {}", path.display()))?;
            Ok(Box::new(read_identifiers(BufReader::new(file))))
        }
        None => bail!("Either --id or --file is required"),
    }
}

/// Scheduling options: CLI flag > config file > built-in default.
pub fn run_options(config: &Config, run: &RunArgs) -> Result<RunOptions> {
    let pipeline = &config.pipeline;
    let options = RunOptions {
        workers: run.workers.unwrap_or(pipeline.workers),
        max_workers: run.max_workers.unwrap_or(pipeline.max_workers),
        batch_size: run.batch_size.or(pipeline.batch_size),
        pool: run.pool.unwrap_or(pipeline.pool),
        quiet: run.quiet,
        worker_program: std::env::current_exe().ok(),
    };
    if options.batch_size == Some(0) {
        bail!("--batch-size must be > 0");
    }
    if options.max_workers == 0 {
        bail!("--max-workers must be > 0");
    }
    Ok(options)
}

/// Run the pipeline and print the summary.
#[cfg(not(tarpaulin_include))]
pub fn execute(
    settings: &AnalyzerSettings,
    ids: Identifiers,
    sink: &mut dyn ResultSink,
    options: &RunOptions,
) -> Result<()> {
    let guard = ProcessGuard::new();
    guard.register_signal_handlers();

    let report = qcscan::run(settings, ids, sink, options, &guard).context("Run failed")?;
    print!("{}", report.render());
    Ok(())
}
