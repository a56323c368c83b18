//! Worker substrates and worker scaling.
//!
//! An [`Executor`] accepts identifiers and hands back completed findings in
//! completion order. The scheduler owns backpressure; executors only run tasks.
//!
//! - [`InlineExecutor`] runs each task on the calling thread (serial mode)
//! - [`ThreadExecutor`](super::threads::ThreadExecutor) runs tasks on a rayon pool
//! - [`ProcessExecutor`](super::process::ProcessExecutor) runs tasks in worker processes

use crate::analyzer::{AnalysisResult, Analyzer, Finding, SentinelKind};
use crate::archive::{ArchiveLayout, Identifier};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Failures of the execution substrate itself.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("worker pool is shut down")]
    Disconnected,

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to start worker dispatcher: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A substrate that runs one analyzer invocation per identifier.
pub trait Executor {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Queue one identifier for analysis.
    fn submit(&mut self, id: Identifier) -> Result<(), ExecutorError>;

    /// Block until the next task completes.
    ///
    /// `None` means the substrate can no longer deliver results; every task
    /// still outstanding is lost.
    fn next_finding(&mut self) -> Option<Finding>;

    /// Release workers. Called once after the last batch.
    fn shutdown(&mut self) {}
}

/// Run one task, converting every failure into a `worker_exception` sentinel.
///
/// Nothing raised by the analyzer, including a panic, escapes this boundary.
pub fn run_task(analyzer: &dyn Analyzer, layout: &ArchiveLayout, id: &Identifier) -> AnalysisResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(&layout.resolve(id))));

    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!(id = %id, analyzer = analyzer.name(), error = %e, "analysis failed");
            AnalysisResult::sentinel(SentinelKind::WorkerException)
        }
        Err(payload) => {
            warn!(id = %id, analyzer = analyzer.name(), panic = panic_message(&*payload), "analysis panicked");
            AnalysisResult::sentinel(SentinelKind::WorkerException)
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Serial executor: each task runs to completion inside `submit`.
pub struct InlineExecutor {
    analyzer: Arc<dyn Analyzer>,
    layout: ArchiveLayout,
    completed: VecDeque<Finding>,
}

impl InlineExecutor {
    pub fn new(analyzer: Arc<dyn Analyzer>, layout: ArchiveLayout) -> Self {
        Self {
            analyzer,
            layout,
            completed: VecDeque::new(),
        }
    }
}

impl Executor for InlineExecutor {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn submit(&mut self, id: Identifier) -> Result<(), ExecutorError> {
        let result = run_task(self.analyzer.as_ref(), &self.layout, &id);
        self.completed.push_back(Finding::new(id, result));
        Ok(())
    }

    fn next_finding(&mut self) -> Option<Finding> {
        self.completed.pop_front()
    }
}

/// Configuration for worker scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Requested worker count; `0` runs serially.
    pub requested: usize,
    /// Independent safety cap.
    pub max_workers: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            requested: 4,
            max_workers: 64,
        }
    }
}

/// Calculates the effective worker count.
#[derive(Debug)]
pub struct WorkerScaler {
    config: WorkerConfig,
}

impl WorkerScaler {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// Effective concurrency: `min(requested, max_workers)`.
    ///
    /// `0` means serial execution on the scheduler thread.
    pub fn calculate_workers(&self) -> usize {
        self.config.requested.min(self.config.max_workers)
    }
}
