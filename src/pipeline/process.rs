//! Isolated worker processes for CPU- and memory-heavy analyzers.
//!
//! Each worker is a child process running `qcscan worker --settings <JSON>`.
//! The protocol is line based:
//!
//! - parent writes one identifier per line to the worker's stdin
//! - worker answers each with one JSON line `{"id": ..., "result": ...}` on stdout
//!
//! One dispatcher thread per slot owns one worker. A broken pipe, EOF, a
//! malformed reply or an id mismatch is a fault of the substrate: the worker is
//! killed and reaped, the identifier becomes `future_exception`, and a fresh
//! worker is spawned for the next identifier.

use super::executor::{run_task, Executor, ExecutorError};
use crate::analyzer::{AnalysisResult, Analyzer, AnalyzerSettings, Finding, SentinelKind};
use crate::archive::{ArchiveLayout, Identifier};
use crate::utils::process_guard::ProcessGuard;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, warn};

/// How to start one worker process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Re-execute `program` as `program worker --settings <JSON>`.
    pub fn for_settings(
        program: impl Into<PathBuf>,
        settings: &AnalyzerSettings,
    ) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(settings)?;
        Ok(Self::new(
            program,
            vec!["worker".into(), "--settings".into(), json.into()],
        ))
    }

    fn spawn(&self) -> io::Result<WorkerProcess> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        match (stdin, stdout) {
            (Some(stdin), Some(stdout)) => Ok(WorkerProcess {
                child,
                stdin,
                stdout: BufReader::new(stdout),
                line: String::new(),
            }),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "worker pipes unavailable"))
            }
        }
    }
}

/// Ways a worker round trip can fail.
#[derive(Debug, Error)]
enum WorkerFault {
    #[error("pipe error: {0}")]
    Io(#[from] io::Error),

    #[error("worker closed its output")]
    Eof,

    #[error("malformed reply: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("reply for {got} while waiting for {expected}")]
    Mismatch { expected: Identifier, got: Identifier },
}

/// A running worker process.
struct WorkerProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    line: String,
}

impl WorkerProcess {
    fn round_trip(&mut self, id: &Identifier) -> Result<AnalysisResult, WorkerFault> {
        writeln!(self.stdin, "{}", id)?;
        self.stdin.flush()?;

        self.line.clear();
        if self.stdout.read_line(&mut self.line)? == 0 {
            return Err(WorkerFault::Eof);
        }

        let finding: Finding = serde_json::from_str(self.line.trim_end())?;
        if &finding.id != id {
            return Err(WorkerFault::Mismatch {
                expected: id.clone(),
                got: finding.id,
            });
        }
        Ok(finding.result)
    }

    fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Kill and reap, leaving no zombie behind.
    fn kill(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }

    /// Close stdin so the worker drains and exits, then reap it.
    fn shutdown(self) {
        let WorkerProcess { mut child, stdin, .. } = self;
        drop(stdin);
        if let Err(e) = child.wait() {
            warn!(error = %e, "failed to reap worker");
        }
    }
}

/// Executor backed by a fixed number of worker processes.
pub struct ProcessExecutor {
    tasks: Option<Sender<Identifier>>,
    results: Receiver<Finding>,
    dispatchers: Vec<JoinHandle<()>>,
}

impl ProcessExecutor {
    /// Start `slots` dispatchers; workers are spawned lazily on first use.
    pub fn new(command: WorkerCommand, slots: usize, queue_depth: usize) -> Result<Self, ExecutorError> {
        let (task_tx, task_rx) = bounded::<Identifier>(queue_depth.max(1));
        let (result_tx, result_rx) = bounded::<Finding>(queue_depth.max(1));

        let mut dispatchers = Vec::with_capacity(slots.max(1));
        for slot in 0..slots.max(1) {
            let tasks = task_rx.clone();
            let results = result_tx.clone();
            let command = command.clone();
            let handle = thread::Builder::new()
                .name(format!("qcscan-dispatch-{}", slot))
                .spawn(move || dispatch(slot, &command, tasks, results))?;
            dispatchers.push(handle);
        }

        Ok(Self {
            tasks: Some(task_tx),
            results: result_rx,
            dispatchers,
        })
    }
}

/// Feed identifiers to one worker process until the task queue closes.
fn dispatch(slot: usize, command: &WorkerCommand, tasks: Receiver<Identifier>, results: Sender<Finding>) {
    let mut worker: Option<WorkerProcess> = None;

    for id in tasks.iter() {
        if worker.is_none() {
            match command.spawn() {
                Ok(spawned) => {
                    debug!(slot, pid = spawned.pid(), "worker started");
                    worker = Some(spawned);
                }
                Err(e) => warn!(slot, id = %id, error = %e, "failed to start worker"),
            }
        }

        let result = match worker.as_mut().map(|w| w.round_trip(&id)) {
            Some(Ok(result)) => result,
            Some(Err(fault)) => {
                warn!(slot, id = %id, error = %fault, "worker failed, restarting");
                if let Some(dead) = worker.take() {
                    dead.kill();
                }
                AnalysisResult::sentinel(SentinelKind::FutureException)
            }
            None => AnalysisResult::sentinel(SentinelKind::FutureException),
        };

        if results.send(Finding::new(id, result)).is_err() {
            break;
        }
    }

    if let Some(worker) = worker {
        worker.shutdown();
    }
}

impl Executor for ProcessExecutor {
    fn name(&self) -> &'static str {
        "processes"
    }

    fn submit(&mut self, id: Identifier) -> Result<(), ExecutorError> {
        let tasks = self.tasks.as_ref().ok_or(ExecutorError::Disconnected)?;
        tasks.send(id).map_err(|_| ExecutorError::Disconnected)
    }

    fn next_finding(&mut self) -> Option<Finding> {
        self.results.recv().ok()
    }

    fn shutdown(&mut self) {
        self.tasks.take();
        for handle in self.dispatchers.drain(..) {
            if handle.join().is_err() {
                warn!("worker dispatcher panicked");
            }
        }
    }
}

impl Drop for ProcessExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker-process side of the protocol.
///
/// Answers every identifier read from `input` with one JSON line on `output`
/// until `input` closes or the parent process dies. Returns the number of
/// identifiers served.
pub fn serve_worker<R: BufRead, W: Write>(
    analyzer: &dyn Analyzer,
    layout: &ArchiveLayout,
    input: R,
    mut output: W,
    guard: &ProcessGuard,
) -> io::Result<usize> {
    let mut served = 0;

    for line in input.lines() {
        if guard.is_orphaned() {
            warn!("parent process exited, stopping worker");
            break;
        }
        let id = Identifier::new(line?);
        if id.as_str().is_empty() {
            continue;
        }

        let result = run_task(analyzer, layout, &id);
        serde_json::to_writer(&mut output, &Finding::new(id, result))?;
        output.write_all(b"\n")?;
        output.flush()?;
        served += 1;
    }

    Ok(served)
}
