//! Ctrl-C handling.
//!
//! The first SIGINT/SIGTERM only raises a flag that the scan, prompt and
//! execution loops poll between steps. A second one terminates the process
//! with status 130.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

use crate::errors::{Error, Result};

/// Exit status used when the user insists on stopping.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    /// A flag nothing is wired to yet. Tests use this directly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a flag and hook it to SIGINT and SIGTERM.
    ///
    /// Registration is best-effort; a failure is logged and the run goes on
    /// without graceful interruption.
    pub fn install() -> Self {
        let interrupt = Self::new();
        for signal in [SIGINT, SIGTERM] {
            // Order matters: the exit hook sees the flag before this press sets it.
            let conditional = signal_hook::flag::register_conditional_shutdown(
                signal,
                INTERRUPTED_EXIT_CODE,
                Arc::clone(&interrupt.flag),
            );
            let flag = signal_hook::flag::register(signal, Arc::clone(&interrupt.flag));
            if let Err(e) = conditional.and(flag) {
                tracing::warn!(signal, error = %e, "failed to register signal handler");
            }
        }
        interrupt
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// `Err(Interrupted)` once the flag is raised.
    pub fn check(&self) -> Result<()> {
        if self.is_set() {
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }
}
