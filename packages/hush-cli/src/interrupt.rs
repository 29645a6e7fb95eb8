//! Ctrl-C handling for the `open` command.
//!
//! While an unlock is pending, Ctrl-C cancels it and the command reports
//! the cancellation. At any other point Ctrl-C ends the process.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use hush_core::{cancel_pair, CancelSignal, Canceller};

/// Exit status for a process stopped by SIGINT
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// What a Ctrl-C press should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// An unlock was pending and has been cancelled
    CancelledUnlock,
    /// Nothing to cancel; stop the process
    Exit,
}

/// Routes Ctrl-C to the pending unlock, if any
#[derive(Debug, Default)]
pub struct InterruptHandler {
    pending_unlock: Mutex<Option<Canceller>>,
}

impl InterruptHandler {
    /// Register a new pending unlock and return its signal
    pub fn begin_unlock(&self) -> CancelSignal {
        let (canceller, signal) = cancel_pair();
        *self.pending_unlock.lock() = Some(canceller);
        signal
    }

    /// The unlock finished one way or another; Ctrl-C exits from now on
    pub fn unlock_finished(&self) {
        self.pending_unlock.lock().take();
    }

    /// Handle one Ctrl-C press
    pub fn on_interrupt(&self) -> InterruptAction {
        match self.pending_unlock.lock().take() {
            Some(canceller) => {
                canceller.cancel();
                InterruptAction::CancelledUnlock
            }
            None => InterruptAction::Exit,
        }
    }
}

/// Listen for Ctrl-C until the returned handle is aborted
pub fn watch(handler: Arc<InterruptHandler>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match handler.on_interrupt() {
                InterruptAction::CancelledUnlock => {
                    tracing::debug!("Ctrl-C cancelled the pending unlock");
                }
                InterruptAction::Exit => {
                    tracing::debug!("Ctrl-C received, exiting");
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            }
        }
    })
}
