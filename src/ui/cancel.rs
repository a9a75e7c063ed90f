//! Cooperative cancellation
//!
//! Ctrl+C never touches the conversation. The signal thread only flips
//! a shared flag (and prints a notice); the chat loop polls the flag at
//! its safe points and asks the user what to do. A second Ctrl+C while
//! the first is still pending terminates the process with exit code 130.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

/// Exit code used when a second interrupt forces termination
pub const INTERRUPT_EXIT_CODE: i32 = 130;

/// Shared "interrupt pending" flag
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    requested: Arc<AtomicBool>,
    notice_pending: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an interrupt as pending
    ///
    /// Returns false when one was already pending.
    pub fn request(&self) -> bool {
        let fresh = !self.requested.swap(true, Ordering::SeqCst);
        if fresh {
            self.notice_pending.store(true, Ordering::SeqCst);
        }
        fresh
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Clear the pending interrupt (main control path only)
    pub fn clear(&self) {
        self.requested.store(false, Ordering::SeqCst);
        self.notice_pending.store(false, Ordering::SeqCst);
    }

    /// True once per request, so the "waiting" notice is shown only once
    pub fn take_notice(&self) -> bool {
        self.notice_pending.swap(false, Ordering::SeqCst)
    }
}

/// Keeps the SIGINT listener alive; dropping it stops the listener
pub struct SigintGuard {
    #[cfg(unix)]
    handle: signal_hook::iterator::Handle,
    #[cfg(unix)]
    thread: Option<std::thread::JoinHandle<()>>,
}

/// Route SIGINT into `token`
#[cfg(unix)]
pub fn install_sigint_handler(token: CancellationToken) -> Result<SigintGuard> {
    use signal_hook::consts::signal::SIGINT;
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT]).context("failed to register SIGINT handler")?;
    let handle = signals.handle();
    let thread = std::thread::spawn(move || {
        for _ in signals.forever() {
            if token.request() {
                tracing::debug!(event = "interrupt", pending = true);
                println!("\nCtrl+C received. Will prompt after the current action.");
            } else {
                tracing::debug!(event = "interrupt", forced_exit = true);
                println!();
                std::process::exit(INTERRUPT_EXIT_CODE);
            }
        }
    });

    Ok(SigintGuard {
        handle,
        thread: Some(thread),
    })
}

#[cfg(not(unix))]
pub fn install_sigint_handler(_token: CancellationToken) -> Result<SigintGuard> {
    Ok(SigintGuard {})
}

impl Drop for SigintGuard {
    #[cfg(unix)]
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    #[cfg(not(unix))]
    fn drop(&mut self) {}
}
