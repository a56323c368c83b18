//! Progress reporting for long scans.
//!
//! One stderr line rewritten after every batch. Disabled in quiet mode and
//! when stderr is not a terminal, so redirected logs stay clean.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Default progress reporter that writes to stderr.
pub struct DefaultProgressReporter {
    /// Whether to show output (can be disabled for quiet mode)
    show_output: bool,
    /// Whether a progress line is currently displayed
    started: AtomicBool,
}

impl DefaultProgressReporter {
    /// Create a progress reporter that shows output.
    pub fn new() -> Self {
        Self {
            show_output: true,
            started: AtomicBool::new(false),
        }
    }

    /// Create a progress reporter with output disabled.
    pub fn quiet() -> Self {
        Self {
            show_output: false,
            started: AtomicBool::new(false),
        }
    }

    /// Reporter for a run: silent when `quiet` or when stderr is redirected.
    pub fn for_stderr(quiet: bool) -> Self {
        if quiet || !io::stderr().is_terminal() {
            Self::quiet()
        } else {
            Self::new()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.show_output
    }

    /// Report that one batch has been drained.
    pub fn batch_completed(&self, batches: usize, processed: usize) {
        if !self.show_output {
            return;
        }
        self.started.store(true, Ordering::SeqCst);
        eprint!(
            "\r  [batch {}] {} identifier{} processed...",
            batches,
            processed,
            if processed == 1 { "" } else { "s" }
        );
        let _ = io::stderr().flush();
    }

    /// Clear the progress line.
    pub fn finish(&self) {
        if self.show_output && self.started.swap(false, Ordering::SeqCst) {
            eprint!("\r{:60}\r", "");
            let _ = io::stderr().flush();
        }
    }
}

impl Default for DefaultProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
