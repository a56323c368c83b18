//! Batch scheduler with bounded in-flight work.
//!
//! Reads one batch of identifiers, submits all of them, and drains every
//! outstanding task before reading the next batch. Peak memory is therefore
//! bounded by the batch size, not by the length of the input.
//!
//! Every submitted identifier yields exactly one finding:
//! - a failed submission becomes `future_exception` immediately
//! - if the executor stops delivering results, every task still outstanding
//!   becomes `future_exception`

use super::batch::Batches;
use super::executor::Executor;
use super::PipelineError;
use crate::analyzer::{AnalysisResult, Finding, SentinelKind};
use crate::archive::Identifier;
use crate::output::SinkError;
use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Receives completed findings on the scheduler thread.
pub trait ResultConsumer {
    fn consume(&mut self, finding: Finding) -> Result<(), SinkError>;

    /// Called after each batch has been fully drained.
    fn end_batch(&mut self, _stats: &ScheduleStats) -> Result<(), SinkError> {
        Ok(())
    }
}

impl ResultConsumer for Vec<Finding> {
    fn consume(&mut self, finding: Finding) -> Result<(), SinkError> {
        self.push(finding);
        Ok(())
    }
}

/// Scheduling statistics of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    pub submitted: usize,
    pub completed: usize,
    pub batches: usize,
    pub max_in_flight: usize,
    pub interrupted: bool,
}

/// Feeds identifiers to an executor one bounded batch at a time.
#[derive(Debug, Clone)]
pub struct Scheduler {
    batch_size: usize,
    interrupt: Option<Arc<AtomicBool>>,
}

impl Scheduler {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            interrupt: None,
        }
    }

    /// Stop reading new batches once `flag` is set.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn is_interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Process the whole identifier stream.
    ///
    /// Only input read errors and consumer (output) errors abort the run.
    pub fn run<I>(
        &self,
        ids: I,
        executor: &mut dyn Executor,
        consumer: &mut dyn ResultConsumer,
    ) -> Result<ScheduleStats, PipelineError>
    where
        I: Iterator<Item = io::Result<Identifier>>,
    {
        let mut stats = ScheduleStats::default();
        let mut batches = Batches::new(ids, self.batch_size);

        loop {
            if self.is_interrupted() {
                warn!(batches = stats.batches, "interrupted, not reading further batches");
                stats.interrupted = true;
                break;
            }
            let Some(batch) = batches.next() else {
                break;
            };
            let batch = batch.map_err(PipelineError::Input)?;

            debug!(batch = stats.batches + 1, size = batch.len(), "submitting batch");
            self.run_batch(batch, executor, consumer, &mut stats)?;
            stats.batches += 1;
            consumer.end_batch(&stats)?;
        }

        executor.shutdown();
        Ok(stats)
    }

    fn run_batch(
        &self,
        batch: Vec<Identifier>,
        executor: &mut dyn Executor,
        consumer: &mut dyn ResultConsumer,
        stats: &mut ScheduleStats,
    ) -> Result<(), PipelineError> {
        let mut outstanding: BTreeMap<Identifier, usize> = BTreeMap::new();
        let mut in_flight = 0usize;

        for id in batch {
            stats.submitted += 1;
            match executor.submit(id.clone()) {
                Ok(()) => {
                    *outstanding.entry(id).or_default() += 1;
                    in_flight += 1;
                    stats.max_in_flight = stats.max_in_flight.max(in_flight);
                }
                Err(e) => {
                    warn!(id = %id, executor = executor.name(), error = %e, "submission failed");
                    Self::deliver(consumer, stats, Finding::new(id, lost()))?;
                }
            }
        }

        while in_flight > 0 {
            match executor.next_finding() {
                Some(finding) => {
                    if !release(&mut outstanding, &finding.id) {
                        warn!(id = %finding.id, "dropping finding for an identifier that is not outstanding");
                        continue;
                    }
                    in_flight -= 1;
                    Self::deliver(consumer, stats, finding)?;
                }
                None => {
                    warn!(executor = executor.name(), lost = in_flight, "executor stopped delivering results");
                    for (id, count) in std::mem::take(&mut outstanding) {
                        for _ in 0..count {
                            Self::deliver(consumer, stats, Finding::new(id.clone(), lost()))?;
                        }
                    }
                    in_flight = 0;
                }
            }
        }

        Ok(())
    }

    fn deliver(
        consumer: &mut dyn ResultConsumer,
        stats: &mut ScheduleStats,
        finding: Finding,
    ) -> Result<(), PipelineError> {
        stats.completed += 1;
        consumer.consume(finding).map_err(PipelineError::from)
    }
}

fn lost() -> AnalysisResult {
    AnalysisResult::sentinel(SentinelKind::FutureException)
}

/// Remove one occurrence of `id`; false when it was not outstanding.
fn release(outstanding: &mut BTreeMap<Identifier, usize>, id: &Identifier) -> bool {
    match outstanding.get_mut(id) {
        Some(count) if *count > 1 => {
            *count -= 1;
            true
        }
        Some(_) => {
            outstanding.remove(id);
            true
        }
        None => false,
    }
}
