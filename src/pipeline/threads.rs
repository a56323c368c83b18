//! Shared-memory worker pool for I/O-bound analyzers.
//!
//! Tasks run on a dedicated rayon pool and report back over a bounded
//! crossbeam channel. A task that never reports (its job panicked outside the
//! task boundary) is still answered with a `future_exception` by its
//! [`Completion`] guard, so the scheduler never waits for a lost task.

use super::executor::{panic_message, run_task, Executor, ExecutorError};
use crate::analyzer::{AnalysisResult, Analyzer, Finding, SentinelKind};
use crate::archive::{ArchiveLayout, Identifier};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::Arc;
use tracing::error;

/// Sends exactly one finding per task, even if the job unwinds.
struct Completion {
    id: Option<Identifier>,
    tx: Sender<Finding>,
}

impl Completion {
    fn complete(mut self, result: AnalysisResult) {
        if let Some(id) = self.id.take() {
            let _ = self.tx.send(Finding::new(id, result));
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            let _ = self
                .tx
                .send(Finding::new(id, AnalysisResult::sentinel(SentinelKind::FutureException)));
        }
    }
}

/// Executor backed by a rayon thread pool.
pub struct ThreadExecutor {
    pool: rayon::ThreadPool,
    analyzer: Arc<dyn Analyzer>,
    layout: Arc<ArchiveLayout>,
    tx: Sender<Finding>,
    rx: Receiver<Finding>,
}

impl ThreadExecutor {
    /// Create a pool of `workers` threads whose result queue holds `queue_depth` findings.
    pub fn new(
        analyzer: Arc<dyn Analyzer>,
        layout: ArchiveLayout,
        workers: usize,
        queue_depth: usize,
    ) -> Result<Self, ExecutorError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("qcscan-worker-{}", i))
            .panic_handler(|payload| {
                error!(panic = panic_message(&*payload), "worker thread panicked");
            })
            .build()?;
        let (tx, rx) = bounded(queue_depth.max(1));

        Ok(Self {
            pool,
            analyzer,
            layout: Arc::new(layout),
            tx,
            rx,
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Executor for ThreadExecutor {
    fn name(&self) -> &'static str {
        "threads"
    }

    fn submit(&mut self, id: Identifier) -> Result<(), ExecutorError> {
        let analyzer = Arc::clone(&self.analyzer);
        let layout = Arc::clone(&self.layout);
        let completion = Completion {
            id: Some(id.clone()),
            tx: self.tx.clone(),
        };

        self.pool.spawn(move || {
            let result = run_task(analyzer.as_ref(), &layout, &id);
            completion.complete(result);
        });
        Ok(())
    }

    fn next_finding(&mut self) -> Option<Finding> {
        self.rx.recv().ok()
    }
}
