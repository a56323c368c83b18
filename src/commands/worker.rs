//! Worker command handler (process pool entry point)

use anyhow::{Context, Result};
use std::io;
use tracing::debug;

use qcscan::pipeline::serve_worker;
use qcscan::{AnalyzerSettings, ProcessGuard};

/// Answer identifiers from stdin with one JSON finding per line on stdout.
///
/// Interrupts are caught and ignored: the parent drains in-flight work, so the
/// worker keeps serving until its stdin closes or the parent dies.
#[cfg(not(tarpaulin_include))]
pub fn handle(settings_json: &str) -> Result<()> {
    let settings: AnalyzerSettings =
        serde_json::from_str(settings_json).context("Invalid worker settings")?;
    let analyzer = settings.create().context("Failed to build analyzer")?;
    let layout = settings.layout();

    let guard = ProcessGuard::new();
    guard.register_signal_handlers();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let served = serve_worker(analyzer.as_ref(), &layout, stdin.lock(), stdout.lock(), &guard)
        .context("Worker pipe failed")?;

    debug!(served, pid = std::process::id(), "worker exiting");
    Ok(())
}
