//! Run orchestration: batching, worker pools and result aggregation.

pub mod batch;
pub mod executor;
pub mod process;
pub mod progress;
pub mod scheduler;
pub mod summary;
pub mod threads;

pub use batch::{read_identifiers, Batches};
pub use executor::{Executor, ExecutorError, InlineExecutor, WorkerConfig, WorkerScaler};
pub use process::{serve_worker, ProcessExecutor, WorkerCommand};
pub use progress::DefaultProgressReporter;
pub use scheduler::{ResultConsumer, ScheduleStats, Scheduler};
pub use summary::SummaryCounters;
pub use threads::ThreadExecutor;

use crate::analyzer::{Analyzer, AnalyzerKind, AnalyzerSettings, Finding};
use crate::archive::Identifier;
use crate::output::{ResultSink, SinkError};
use crate::utils::ProcessGuard;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

/// Batch size of classification runs when none is configured.
pub const DEFAULT_CLASSIFY_BATCH: usize = 10_000;

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read identifiers: {0}")]
    Input(#[source] io::Error),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("worker pool failed: {0}")]
    Executor(#[from] ExecutorError),

    #[error("invalid error pattern: {0}")]
    Patterns(#[from] regex::Error),

    #[error("failed to encode worker settings: {0}")]
    WorkerSettings(#[from] serde_json::Error),
}

/// Execution substrate for analyzer tasks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    /// Threads for classification, processes for extraction
    #[default]
    Auto,
    /// Shared-memory thread pool
    Threads,
    /// Isolated worker processes
    Processes,
    /// Serial execution on the scheduler thread
    Inline,
}

impl PoolKind {
    /// Concrete substrate for an analyzer kind.
    pub fn resolve(self, kind: AnalyzerKind) -> PoolKind {
        match (self, kind) {
            (PoolKind::Auto, AnalyzerKind::Classify) => PoolKind::Threads,
            (PoolKind::Auto, AnalyzerKind::Extract) => PoolKind::Processes,
            (pool, _) => pool,
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::Auto => write!(f, "auto"),
            PoolKind::Threads => write!(f, "threads"),
            PoolKind::Processes => write!(f, "processes"),
            PoolKind::Inline => write!(f, "inline"),
        }
    }
}

/// How a run is scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Requested concurrency; `0` runs serially.
    pub workers: usize,
    pub max_workers: usize,
    /// `None` picks the per-kind default.
    pub batch_size: Option<usize>,
    pub pool: PoolKind,
    pub quiet: bool,
    /// Binary re-executed as `<program> worker`; required by the process pool.
    pub worker_program: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        let workers = WorkerConfig::default();
        Self {
            workers: workers.requested,
            max_workers: workers.max_workers,
            batch_size: None,
            pool: PoolKind::Auto,
            quiet: true,
            worker_program: None,
        }
    }
}

impl RunOptions {
    pub fn effective_workers(&self) -> usize {
        WorkerScaler::new(WorkerConfig {
            requested: self.workers,
            max_workers: self.max_workers,
        })
        .calculate_workers()
    }

    /// Configured batch size, or 10 000 for classification and two tasks per
    /// worker for extraction.
    pub fn effective_batch_size(&self, kind: AnalyzerKind) -> usize {
        let size = self.batch_size.unwrap_or(match kind {
            AnalyzerKind::Classify => DEFAULT_CLASSIFY_BATCH,
            AnalyzerKind::Extract => 2 * self.effective_workers().max(1),
        });
        size.max(1)
    }
}

/// Outcome of a completed (or interrupted) run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: SummaryCounters,
    pub stats: ScheduleStats,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn render(&self) -> String {
        self.summary.render(self.elapsed)
    }
}

/// Scheduler-side consumer: sink, counters and progress.
struct RunConsumer<'a> {
    sink: &'a mut dyn ResultSink,
    summary: SummaryCounters,
    progress: DefaultProgressReporter,
}

impl ResultConsumer for RunConsumer<'_> {
    fn consume(&mut self, finding: Finding) -> Result<(), SinkError> {
        self.sink.write(&finding)?;
        self.summary.record(&finding);
        Ok(())
    }

    fn end_batch(&mut self, stats: &ScheduleStats) -> Result<(), SinkError> {
        self.sink.flush()?;
        self.progress.batch_completed(stats.batches, stats.completed);
        Ok(())
    }
}

/// Analyze every identifier from `ids`, writing results to `sink`.
///
/// Per-identifier failures become sentinel results; only input, output and
/// pool construction failures return `Err`.
pub fn run<I>(
    settings: &AnalyzerSettings,
    ids: I,
    sink: &mut dyn ResultSink,
    options: &RunOptions,
    guard: &ProcessGuard,
) -> Result<RunReport, PipelineError>
where
    I: Iterator<Item = io::Result<Identifier>>,
{
    let started = Instant::now();
    let analyzer: Arc<dyn Analyzer> = Arc::from(settings.create()?);
    let layout = settings.layout();

    // Peek far enough to tell a single identifier from a batch.
    let mut ids = ids;
    let head: Vec<io::Result<Identifier>> = ids.by_ref().take(2).collect();
    let single = head.len() < 2;
    let ids = head.into_iter().chain(ids);

    let workers = options.effective_workers();
    let batch_size = options.effective_batch_size(settings.kind);
    let mut pool = options.pool.resolve(settings.kind);
    if workers == 0 || single {
        pool = PoolKind::Inline;
    }
    if pool == PoolKind::Processes && options.worker_program.is_none() {
        warn!("no worker program available, falling back to threads");
        pool = PoolKind::Threads;
    }

    info!(
        analyzer = analyzer.name(),
        pool = %pool,
        workers,
        batch_size,
        root = %settings.root.display(),
        "starting run"
    );

    let mut executor: Box<dyn Executor> = match (pool, &options.worker_program) {
        (PoolKind::Processes, Some(program)) => Box::new(ProcessExecutor::new(
            WorkerCommand::for_settings(program, settings)?,
            workers,
            batch_size,
        )?),
        (PoolKind::Threads, _) | (PoolKind::Processes, None) => Box::new(ThreadExecutor::new(
            analyzer,
            layout,
            workers,
            batch_size,
        )?),
        (PoolKind::Inline, _) | (PoolKind::Auto, _) => {
            Box::new(InlineExecutor::new(analyzer, layout))
        }
    };

    let mut consumer = RunConsumer {
        sink,
        summary: SummaryCounters::new(settings.kind),
        progress: DefaultProgressReporter::for_stderr(options.quiet),
    };

    let outcome = Scheduler::new(batch_size)
        .with_interrupt(guard.interrupt_flag())
        .run(ids, executor.as_mut(), &mut consumer);
    consumer.progress.finish();
    let stats = outcome?;
    consumer.sink.flush()?;

    let mut summary = consumer.summary;
    summary.interrupted = stats.interrupted;

    info!(
        processed = summary.processed,
        batches = stats.batches,
        max_in_flight = stats.max_in_flight,
        "run finished"
    );

    Ok(RunReport {
        summary,
        stats,
        elapsed: started.elapsed(),
    })
}
