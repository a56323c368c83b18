//! Interrupt and orphan detection for long-running scans.
//!
//! Detects termination conditions so a run can stop cleanly:
//! - SIGINT (Ctrl+C) via ctrlc handler
//! - SIGHUP (terminal hangup) via signal_hook
//! - Parent process death, for worker processes (reparented to init/subreaper)
//!
//! The scheduler checks the interrupt flag between batches, so a signal stops
//! reading new identifiers while in-flight tasks drain and output is flushed.
//! The orphan detection uses parent PID comparison rather than checking for PID 1,
//! which works correctly on Linux with systemd subreapers and on macOS with launchd.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tracks interrupt signals and parent-process liveness.
pub struct ProcessGuard {
    interrupted: Arc<AtomicBool>,
    #[cfg(unix)]
    initial_ppid: u32,
}

impl Default for ProcessGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessGuard {
    /// Snapshot the current parent PID for later orphan detection.
    pub fn new() -> Self {
        Self {
            interrupted: Arc::new(AtomicBool::new(false)),
            #[cfg(unix)]
            initial_ppid: unsafe { libc::getppid() as u32 },
        }
    }

    /// Register SIGINT (Ctrl+C) and SIGHUP (terminal hangup) handlers.
    ///
    /// Both set the same `interrupted` flag. Only the first registration in a
    /// process installs the Ctrl+C handler; later ones are ignored.
    pub fn register_signal_handlers(&self) {
        let flag = self.interrupted.clone();
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })
        .ok(); // Ignore if handler already set

        #[cfg(unix)]
        {
            use signal_hook::flag::register;
            let _ = register(libc::SIGHUP, self.interrupted.clone());
        }
    }

    /// Whether the interrupted flag was set (by SIGINT or SIGHUP).
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Shared handle to the interrupt flag, for the scheduler.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    /// Detect parent death by comparing current ppid against the initial snapshot.
    ///
    /// Any ppid change means the parent died and this process was reparented.
    #[cfg(unix)]
    pub fn is_orphaned(&self) -> bool {
        let current_ppid = unsafe { libc::getppid() as u32 };
        current_ppid != self.initial_ppid
    }

    #[cfg(not(unix))]
    pub fn is_orphaned(&self) -> bool {
        false
    }
}
